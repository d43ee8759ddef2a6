//! Per-language source templates used when no model output is available

use std::fmt::Write as _;

use crate::classify::Language;

use super::codegen::TaskType;

/// Everything a template needs to render
pub(super) struct Blueprint<'a> {
    pub title: String,
    pub todos: Vec<String>,
    pub task_type: TaskType,
    /// `snake_case` identifier
    pub snake: &'a str,
}

impl Blueprint<'_> {
    fn camel(&self) -> String {
        let pascal = self.pascal();
        let mut chars = pascal.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_lowercase().collect::<String>() + chars.as_str()
        })
    }

    fn pascal(&self) -> String {
        self.snake
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().collect::<String>() + chars.as_str()
                })
            })
            .collect()
    }

    fn is_hello(&self) -> bool {
        self.task_type == TaskType::HelloWorld
    }

    fn is_class(&self) -> bool {
        self.task_type == TaskType::Class
    }

    /// Comment block naming the request and listing the plan
    fn header(&self, comment: &str) -> String {
        let mut out = format!("{comment} {}\n", self.title);
        if !self.todos.is_empty() {
            let _ = writeln!(out, "{comment}\n{comment} Plan:");
            for (i, todo) in self.todos.iter().enumerate() {
                let _ = writeln!(out, "{comment}   {}. {todo}", i + 1);
            }
        }
        out
    }

    /// One comment line per todo at `indent`
    fn steps(&self, comment: &str, indent: &str) -> String {
        if self.todos.is_empty() {
            return format!("{indent}{comment} Implement: {}\n", self.title);
        }
        self.todos
            .iter()
            .enumerate()
            .fold(String::new(), |mut out, (i, todo)| {
                let _ = writeln!(out, "{indent}{comment} Step {}: {todo}", i + 1);
                out
            })
    }
}

/// Render `blueprint` in `language`
pub(super) fn render(language: Language, bp: &Blueprint<'_>) -> String {
    match language {
        Language::Python => python(bp),
        Language::JavaScript => javascript(bp),
        Language::TypeScript => typescript(bp),
        Language::Java => java(bp),
        Language::Cpp => cpp(bp),
        Language::C => c(bp),
        Language::CSharp => csharp(bp),
        Language::Go => go(bp),
        Language::Rust => rust(bp),
        Language::Php => php(bp),
        Language::Ruby => ruby(bp),
        Language::Swift => swift(bp),
        Language::Kotlin => kotlin(bp),
        Language::Html => html(bp),
        Language::Css => css(bp),
        Language::Sql => sql(bp),
        Language::Bash => bash(bp),
        Language::PowerShell => powershell(bp),
        Language::Yaml => yaml(bp),
        Language::Json => json(bp),
        Language::Xml => xml(bp),
    }
}

pub(super) fn python(bp: &Blueprint<'_>) -> String {
    let header = bp.header("#");
    let title = &bp.title;
    if bp.is_hello() {
        return format!(
            "{header}\n\ndef hello_world():\n    \"\"\"Print a friendly greeting.\"\"\"\n    print(\"Hello, World!\")\n\n\nif __name__ == \"__main__\":\n    hello_world()\n"
        );
    }
    if bp.task_type == TaskType::Api {
        return format!(
            "{header}\nimport json\nfrom http.server import BaseHTTPRequestHandler, HTTPServer\n\n\nclass Handler(BaseHTTPRequestHandler):\n    def do_GET(self):\n        body = json.dumps({{\"message\": \"ok\", \"path\": self.path}}).encode()\n        self.send_response(200)\n        self.send_header(\"Content-Type\", \"application/json\")\n        self.end_headers()\n        self.wfile.write(body)\n\n\nif __name__ == \"__main__\":\n    HTTPServer((\"localhost\", 8000), Handler).serve_forever()\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("#", "        ");
        return format!(
            "{header}\n\nclass {name}:\n    \"\"\"{title}\"\"\"\n\n    def __init__(self):\n        self.items = []\n\n    def run(self):\n{steps}        return self.items\n\n\nif __name__ == \"__main__\":\n    print({name}().run())\n"
        );
    }
    let name = bp.snake;
    let steps = bp.steps("#", "    ");
    format!(
        "{header}\n\ndef {name}(*args):\n    \"\"\"{title}\"\"\"\n{steps}    return args\n\n\nif __name__ == \"__main__\":\n    print({name}())\n"
    )
}

fn javascript(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\nfunction helloWorld() {{\n  console.log(\"Hello, World!\");\n}}\n\nhelloWorld();\n\nmodule.exports = helloWorld;\n"
        );
    }
    if bp.task_type == TaskType::Api {
        return format!(
            "{header}\nconst http = require(\"http\");\n\nconst server = http.createServer((req, res) => {{\n  res.writeHead(200, {{ \"Content-Type\": \"application/json\" }});\n  res.end(JSON.stringify({{ message: \"ok\", path: req.url }}));\n}});\n\nserver.listen(3000, () => console.log(\"Listening on http://localhost:3000\"));\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("//", "    ");
        return format!(
            "{header}\nclass {name} {{\n  constructor() {{\n    this.items = [];\n  }}\n\n  run() {{\n{steps}    return this.items;\n  }}\n}}\n\nconsole.log(new {name}().run());\n\nmodule.exports = {name};\n"
        );
    }
    let name = bp.camel();
    let steps = bp.steps("//", "  ");
    format!(
        "{header}\nfunction {name}(...args) {{\n{steps}  return args;\n}}\n\nconsole.log({name}());\n\nmodule.exports = {name};\n"
    )
}

fn typescript(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\nexport function helloWorld(): void {{\n  console.log(\"Hello, World!\");\n}}\n\nhelloWorld();\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("//", "    ");
        return format!(
            "{header}\nexport class {name} {{\n  private items: string[] = [];\n\n  run(): string[] {{\n{steps}    return this.items;\n  }}\n}}\n\nconsole.log(new {name}().run());\n"
        );
    }
    let name = bp.camel();
    let steps = bp.steps("//", "  ");
    format!(
        "{header}\nexport function {name}(...args: unknown[]): unknown[] {{\n{steps}  return args;\n}}\n\nconsole.log({name}());\n"
    )
}

fn java(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\nclass HelloWorld {{\n    static void helloWorld() {{\n        System.out.println(\"Hello, World!\");\n    }}\n\n    public static void main(String[] args) {{\n        helloWorld();\n    }}\n}}\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("//", "        ");
        return format!(
            "{header}\nimport java.util.ArrayList;\nimport java.util.List;\n\nclass {name} {{\n    private final List<String> items = new ArrayList<>();\n\n    List<String> run() {{\n{steps}        return items;\n    }}\n\n    public static void main(String[] args) {{\n        System.out.println(new {name}().run());\n    }}\n}}\n"
        );
    }
    let name = bp.camel();
    let steps = bp.steps("//", "        ");
    format!(
        "{header}\nimport java.util.Arrays;\n\nclass Main {{\n    static Object[] {name}(Object... args) {{\n{steps}        return args;\n    }}\n\n    public static void main(String[] args) {{\n        System.out.println(Arrays.toString({name}()));\n    }}\n}}\n"
    )
}

fn cpp(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\n#include <iostream>\n\nvoid helloWorld() {{\n    std::cout << \"Hello, World!\" << std::endl;\n}}\n\nint main() {{\n    helloWorld();\n    return 0;\n}}\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("//", "        ");
        return format!(
            "{header}\n#include <iostream>\n#include <string>\n#include <vector>\n\nclass {name} {{\npublic:\n    std::vector<std::string> run() {{\n{steps}        return items_;\n    }}\n\nprivate:\n    std::vector<std::string> items_;\n}};\n\nint main() {{\n    {name} instance;\n    std::cout << instance.run().size() << std::endl;\n    return 0;\n}}\n"
        );
    }
    let name = bp.snake;
    let steps = bp.steps("//", "    ");
    format!(
        "{header}\n#include <iostream>\n\nint {name}() {{\n{steps}    return 0;\n}}\n\nint main() {{\n    std::cout << {name}() << std::endl;\n    return 0;\n}}\n"
    )
}

fn c(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\n#include <stdio.h>\n\nvoid hello_world(void) {{\n    printf(\"Hello, World!\\n\");\n}}\n\nint main(void) {{\n    hello_world();\n    return 0;\n}}\n"
        );
    }
    let name = bp.snake;
    let steps = bp.steps("//", "    ");
    format!(
        "{header}\n#include <stdio.h>\n\nint {name}(void) {{\n{steps}    return 0;\n}}\n\nint main(void) {{\n    printf(\"%d\\n\", {name}());\n    return 0;\n}}\n"
    )
}

fn csharp(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\nusing System;\n\nclass Program\n{{\n    static void HelloWorld()\n    {{\n        Console.WriteLine(\"Hello, World!\");\n    }}\n\n    static void Main()\n    {{\n        HelloWorld();\n    }}\n}}\n"
        );
    }
    let name = bp.pascal();
    if bp.is_class() {
        let steps = bp.steps("//", "        ");
        return format!(
            "{header}\nusing System;\nusing System.Collections.Generic;\n\nclass {name}\n{{\n    private readonly List<string> items = new List<string>();\n\n    public List<string> Run()\n    {{\n{steps}        return items;\n    }}\n}}\n\nclass Program\n{{\n    static void Main()\n    {{\n        Console.WriteLine(new {name}().Run().Count);\n    }}\n}}\n"
        );
    }
    let steps = bp.steps("//", "        ");
    format!(
        "{header}\nusing System;\n\nclass Program\n{{\n    static object[] {name}(params object[] args)\n    {{\n{steps}        return args;\n    }}\n\n    static void Main()\n    {{\n        Console.WriteLine({name}().Length);\n    }}\n}}\n"
    )
}

fn go(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\npackage main\n\nimport \"fmt\"\n\nfunc helloWorld() {{\n\tfmt.Println(\"Hello, World!\")\n}}\n\nfunc main() {{\n\thelloWorld()\n}}\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("//", "\t");
        return format!(
            "{header}\npackage main\n\nimport \"fmt\"\n\ntype {name} struct {{\n\titems []string\n}}\n\nfunc (s *{name}) Run() []string {{\n{steps}\treturn s.items\n}}\n\nfunc main() {{\n\tfmt.Println((&{name}{{}}).Run())\n}}\n"
        );
    }
    let name = bp.camel();
    let steps = bp.steps("//", "\t");
    format!(
        "{header}\npackage main\n\nimport \"fmt\"\n\nfunc {name}(args ...any) []any {{\n{steps}\treturn args\n}}\n\nfunc main() {{\n\tfmt.Println({name}())\n}}\n"
    )
}

fn rust(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\nfn hello_world() {{\n    println!(\"Hello, World!\");\n}}\n\nfn main() {{\n    hello_world();\n}}\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("//", "        ");
        return format!(
            "{header}\n#[derive(Debug, Default)]\nstruct {name} {{\n    items: Vec<String>,\n}}\n\nimpl {name} {{\n    fn run(&self) -> &[String] {{\n{steps}        &self.items\n    }}\n}}\n\nfn main() {{\n    println!(\"{{:?}}\", {name}::default().run());\n}}\n"
        );
    }
    let name = bp.snake;
    let steps = bp.steps("//", "    ");
    format!(
        "{header}\nfn {name}(args: &[&str]) -> Vec<String> {{\n{steps}    args.iter().map(ToString::to_string).collect()\n}}\n\nfn main() {{\n    println!(\"{{:?}}\", {name}(&[]));\n}}\n"
    )
}

fn php(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "<?php\n\n{header}\nfunction helloWorld(): void\n{{\n    echo \"Hello, World!\\n\";\n}}\n\nhelloWorld();\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("//", "        ");
        return format!(
            "<?php\n\n{header}\nclass {name}\n{{\n    private array $items = [];\n\n    public function run(): array\n    {{\n{steps}        return $this->items;\n    }}\n}}\n\nprint_r((new {name}())->run());\n"
        );
    }
    let name = bp.camel();
    let steps = bp.steps("//", "    ");
    format!(
        "<?php\n\n{header}\nfunction {name}(...$args): array\n{{\n{steps}    return $args;\n}}\n\nprint_r({name}());\n"
    )
}

fn ruby(bp: &Blueprint<'_>) -> String {
    let header = bp.header("#");
    if bp.is_hello() {
        return format!(
            "{header}\ndef hello_world\n  puts \"Hello, World!\"\nend\n\nhello_world if __FILE__ == $PROGRAM_NAME\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("#", "    ");
        return format!(
            "{header}\nclass {name}\n  def initialize\n    @items = []\n  end\n\n  def run\n{steps}    @items\n  end\nend\n\np {name}.new.run if __FILE__ == $PROGRAM_NAME\n"
        );
    }
    let name = bp.snake;
    let steps = bp.steps("#", "  ");
    format!(
        "{header}\ndef {name}(*args)\n{steps}  args\nend\n\np {name} if __FILE__ == $PROGRAM_NAME\n"
    )
}

fn swift(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\nfunc helloWorld() {{\n    print(\"Hello, World!\")\n}}\n\nhelloWorld()\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("//", "        ");
        return format!(
            "{header}\nclass {name} {{\n    var items: [String] = []\n\n    func run() -> [String] {{\n{steps}        return items\n    }}\n}}\n\nprint({name}().run())\n"
        );
    }
    let name = bp.camel();
    let steps = bp.steps("//", "    ");
    format!(
        "{header}\nfunc {name}(_ args: Any...) -> [Any] {{\n{steps}    return args\n}}\n\nprint({name}())\n"
    )
}

fn kotlin(bp: &Blueprint<'_>) -> String {
    let header = bp.header("//");
    if bp.is_hello() {
        return format!(
            "{header}\nfun helloWorld() {{\n    println(\"Hello, World!\")\n}}\n\nfun main() {{\n    helloWorld()\n}}\n"
        );
    }
    if bp.is_class() {
        let name = bp.pascal();
        let steps = bp.steps("//", "        ");
        return format!(
            "{header}\nclass {name} {{\n    private val items = mutableListOf<String>()\n\n    fun run(): List<String> {{\n{steps}        return items\n    }}\n}}\n\nfun main() {{\n    println({name}().run())\n}}\n"
        );
    }
    let name = bp.camel();
    let steps = bp.steps("//", "    ");
    format!(
        "{header}\nfun {name}(vararg args: Any): List<Any> {{\n{steps}    return args.toList()\n}}\n\nfun main() {{\n    println({name}())\n}}\n"
    )
}

fn html(bp: &Blueprint<'_>) -> String {
    let title = &bp.title;
    let heading = if bp.is_hello() { "Hello, World!" } else { title.as_str() };
    let items = bp.todos.iter().fold(String::new(), |mut out, todo| {
        let _ = writeln!(out, "      <li>{todo}</li>");
        out
    });
    format!(
        "<!DOCTYPE html>\n<!-- {title} -->\n<html lang=\"en\">\n  <head>\n    <meta charset=\"utf-8\">\n    <title>{heading}</title>\n  </head>\n  <body>\n    <h1>{heading}</h1>\n    <ul>\n{items}    </ul>\n  </body>\n</html>\n"
    )
}

fn css(bp: &Blueprint<'_>) -> String {
    let title = &bp.title;
    let steps = bp.todos.iter().fold(String::new(), |mut out, todo| {
        let _ = writeln!(out, " * - {todo}");
        out
    });
    let greeting = if bp.is_hello() {
        "\nbody::before {\n  content: \"Hello, World!\";\n}\n"
    } else {
        ""
    };
    format!(
        "/*\n * {title}\n{steps} */\n\nbody {{\n  font-family: system-ui, sans-serif;\n  margin: 2rem;\n}}\n{greeting}"
    )
}

fn sql(bp: &Blueprint<'_>) -> String {
    let header = bp.header("--");
    if bp.is_hello() {
        return format!("{header}\nSELECT 'Hello, World!' AS greeting;\n");
    }
    let table = bp.snake;
    format!(
        "{header}\nCREATE TABLE IF NOT EXISTS {table} (\n    id INTEGER PRIMARY KEY,\n    name TEXT NOT NULL,\n    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n);\n\nINSERT INTO {table} (name) VALUES ('example');\n\nSELECT * FROM {table};\n"
    )
}

fn bash(bp: &Blueprint<'_>) -> String {
    let header = bp.header("#");
    if bp.is_hello() {
        return format!(
            "#!/usr/bin/env bash\n{header}\nset -euo pipefail\n\nhello_world() {{\n  echo \"Hello, World!\"\n}}\n\nhello_world\n"
        );
    }
    let name = bp.snake;
    let steps = bp.steps("#", "  ");
    format!(
        "#!/usr/bin/env bash\n{header}\nset -euo pipefail\n\n{name}() {{\n{steps}  echo \"$@\"\n}}\n\n{name} \"$@\"\n"
    )
}

fn powershell(bp: &Blueprint<'_>) -> String {
    let header = bp.header("#");
    if bp.is_hello() {
        return format!(
            "{header}\nfunction Write-HelloWorld {{\n    Write-Output \"Hello, World!\"\n}}\n\nWrite-HelloWorld\n"
        );
    }
    let name = bp.pascal();
    let steps = bp.steps("#", "    ");
    format!(
        "{header}\nfunction Invoke-{name} {{\n    param([object[]]$Arguments)\n{steps}    return $Arguments\n}}\n\nInvoke-{name}\n"
    )
}

fn yaml(bp: &Blueprint<'_>) -> String {
    let header = bp.header("#");
    if bp.is_hello() {
        return format!("{header}\ngreeting: \"Hello, World!\"\n");
    }
    let name = bp.snake;
    let title = &bp.title;
    let steps = bp.todos.iter().fold(String::new(), |mut out, todo| {
        let _ = writeln!(out, "  - \"{todo}\"");
        out
    });
    format!("{header}\nname: {name}\ndescription: \"{title}\"\nsteps:\n{steps}")
}

fn json(bp: &Blueprint<'_>) -> String {
    let value = if bp.is_hello() {
        serde_json::json!({ "greeting": "Hello, World!" })
    } else {
        serde_json::json!({
            "name": bp.snake,
            "description": bp.title,
            "steps": bp.todos,
        })
    };
    serde_json::to_string_pretty(&value).unwrap_or_default() + "\n"
}

fn xml(bp: &Blueprint<'_>) -> String {
    let title = &bp.title;
    if bp.is_hello() {
        return format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- {title} -->\n<greeting>Hello, World!</greeting>\n"
        );
    }
    let name = bp.snake;
    let steps = bp.todos.iter().fold(String::new(), |mut out, todo| {
        let _ = writeln!(out, "    <step>{todo}</step>");
        out
    });
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- {title} -->\n<task name=\"{name}\">\n  <description>{title}</description>\n  <steps>\n{steps}  </steps>\n</task>\n"
    )
}
