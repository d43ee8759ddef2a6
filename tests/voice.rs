//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use pair_voice::voice::{DetectorState, SAMPLE_RATE, WakeWordDetector, rms, samples_to_wav};
use std::io::Cursor;

const THRESHOLD: f32 = 0.03;

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

fn detector(words: &[&str]) -> WakeWordDetector {
    WakeWordDetector::new(words.iter().map(ToString::to_string).collect(), THRESHOLD)
}

#[test]
fn test_wake_word_normalization() {
    let detector = WakeWordDetector::new(
        vec!["  Hey BLUEBERRY  ".to_string(), String::new(), "PAIR".to_string()],
        THRESHOLD,
    );

    assert_eq!(detector.state(), DetectorState::Idle);
    assert_eq!(detector.wake_words(), &["hey blueberry", "pair"]);
}

#[test]
fn test_wake_word_case_insensitive() {
    let mut detector = detector(&["blueberry"]);

    assert!(detector.check_wake_word("BLUEBERRY"));
    detector.reset();

    assert!(detector.check_wake_word("hey BlueBerry, you there?"));
    assert_eq!(detector.state(), DetectorState::Activated);
}

#[test]
fn test_missed_wake_word_resets() {
    let mut detector = detector(&["blueberry"]);
    detector.process(&generate_sine_samples(440.0, 0.5, 0.3));
    assert_eq!(detector.state(), DetectorState::Listening);

    assert!(!detector.check_wake_word("strawberry"));
    assert_eq!(detector.state(), DetectorState::Idle);
    assert!(detector.take_speech_buffer().is_empty());
}

#[test]
fn test_speech_activity_detection() {
    let mut detector = detector(&["blueberry"]);

    // Silent samples - should not trigger
    assert!(!detector.process(&generate_silence(0.1)));
    assert_eq!(detector.state(), DetectorState::Idle);

    // Loud samples - should start listening
    detector.process(&generate_sine_samples(440.0, 0.5, 0.3));
    assert_eq!(detector.state(), DetectorState::Listening);

    detector.process(&generate_sine_samples(440.0, 0.3, 0.3));

    // Trailing silence completes the segment
    assert!(detector.process(&generate_silence(0.6)));
}

#[test]
fn test_short_noise_is_discarded() {
    let mut detector = detector(&["blueberry"]);

    detector.process(&generate_sine_samples(440.0, 0.1, 0.3));
    assert_eq!(detector.state(), DetectorState::Listening);

    assert!(!detector.process(&generate_silence(1.1)));
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_speech_buffer_accumulation() {
    let mut detector = detector(&["blueberry"]);

    let chunk1 = generate_sine_samples(440.0, 0.1, 0.3);
    detector.process(&chunk1);
    let chunk2 = generate_sine_samples(440.0, 0.1, 0.3);
    detector.process(&chunk2);

    let taken = detector.take_speech_buffer();
    assert_eq!(taken.len(), chunk1.len() + chunk2.len());
    assert!(detector.take_speech_buffer().is_empty());
}

#[test]
fn test_activated_state_accumulates() {
    let mut detector = detector(&["blueberry"]);
    detector.activate();

    let speech = generate_sine_samples(440.0, 0.3, 0.3);
    detector.process(&speech);
    let more = generate_sine_samples(440.0, 0.2, 0.3);
    detector.process(&more);

    assert!(detector.has_speech());
    assert_eq!(detector.take_speech_buffer().len(), speech.len() + more.len());
}

#[test]
fn test_utterance_complete_detection() {
    let mut detector = detector(&["blueberry"]);
    detector.check_wake_word("blueberry");

    detector.process(&generate_sine_samples(440.0, 0.5, 0.3));
    assert!(!detector.is_utterance_complete());

    detector.process(&generate_silence(0.6));
    assert!(detector.is_utterance_complete());
}

#[test]
fn test_rms_separates_speech_from_silence() {
    assert!(rms(&generate_silence(0.1)) < THRESHOLD);
    assert!(rms(&generate_sine_samples(440.0, 0.1, 0.3)) > THRESHOLD);
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");
    assert!(wav_data.len() > 44);
}

#[test]
fn test_wav_roundtrip() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
    assert_eq!(read_samples[3], 32767);
}
