//! The demo site.
//!
//! A handful of static pages plus a `/api/run` endpoint that runs a tiny
//! `print(...)` language, standing in for the runtime the bridge fronts.

use std::sync::Arc;

use async_trait::async_trait;
use fsk_bridge::{Method, Request, RequestHandler, RuntimeConsole};

const HOME: &str = r#"<html><body>
<h1>FSK demo site</h1>
<nav><a href="/about"><span>About</span></a> <a href="/docs">Docs</a> <a href="https://example.com">Elsewhere</a></nav>
<button id="run">Run</button>
</body></html>"#;

const ABOUT: &str = r#"<html><body>
<h1>About</h1>
<p>Every page here was written to response.tmp by the runtime.</p>
<a href="/">Home</a>
</body></html>"#;

const DOCS: &str = r#"<html><body>
<h1>Docs</h1>
<p>POST a script to /api/run and the output comes back as plain text.</p>
<a href="/">Home</a>
</body></html>"#;

/// Serves the demo pages and the script endpoint.
pub struct DemoSite {
    console: Arc<RuntimeConsole>,
}

impl DemoSite {
    pub fn new(console: Arc<RuntimeConsole>) -> Self {
        Self { console }
    }

    fn page(path: &str) -> String {
        match path {
            "/" => HOME.to_string(),
            "/about" => ABOUT.to_string(),
            "/docs" => DOCS.to_string(),
            // Deliberately tiny: shows up as a short-content warning.
            "/tiny" => "<p>ok</p>".to_string(),
            other => format!(
                "<html><body><h1>404</h1><p>No page at {other}.</p><a href=\"/\">Home</a></body></html>"
            ),
        }
    }
}

#[async_trait]
impl RequestHandler for DemoSite {
    async fn handle(&self, request: Request) -> String {
        let path = request.path.split(['?', '#']).next().unwrap_or_default();
        if path != "/api/run" {
            return Self::page(path);
        }
        if request.method != Method::Post {
            return "error: /api/run expects POST".to_string();
        }

        match run_script(&request.body) {
            Ok(output) => {
                for line in output.lines() {
                    self.console.print(line);
                }
                output
            }
            Err(e) => {
                self.console.print_err(&e);
                format!("error: {e}")
            }
        }
    }
}

/// Run a script of `print(...)` statements, one per line.
///
/// Arguments are either a double-quoted string or an integer sum such as
/// `1 + 2 - 3`.
pub fn run_script(source: &str) -> Result<String, String> {
    let mut output = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let arg = line
            .strip_prefix("print(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| format!("line {}: expected print(...)", index + 1))?;
        output.push(eval_arg(arg.trim()).map_err(|e| format!("line {}: {e}", index + 1))?);
    }
    Ok(output.join("\n"))
}

fn eval_arg(arg: &str) -> Result<String, String> {
    if let Some(text) = arg.strip_prefix('"').and_then(|a| a.strip_suffix('"')) {
        return Ok(text.to_string());
    }
    eval_sum(arg).map(|n| n.to_string())
}

fn eval_sum(expr: &str) -> Result<i64, String> {
    let normalized = expr.replace(' ', "").replace('-', "+-");
    let mut total: i64 = 0;
    for (i, term) in normalized.split('+').enumerate() {
        if term.is_empty() && i == 0 {
            continue;
        }
        let value: i64 = term
            .parse()
            .map_err(|_| format!("cannot evaluate '{expr}'"))?;
        total = total
            .checked_add(value)
            .ok_or_else(|| "integer overflow".to_string())?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_script() {
        assert_eq!(run_script("print(1 + 2)").unwrap(), "3");
        assert_eq!(run_script("print(10 - 4 - 1)").unwrap(), "5");
        assert_eq!(run_script("print(-3)").unwrap(), "-3");
        assert_eq!(
            run_script("print(\"hi\")\n\n# note\nprint(2)").unwrap(),
            "hi\n2"
        );
        assert_eq!(run_script("").unwrap(), "");
    }

    #[test]
    fn test_run_script_errors() {
        assert!(run_script("exit()").unwrap_err().contains("line 1"));
        assert!(run_script("print(1)\nprint(1 ++ 2)").unwrap_err().contains("line 2"));
        assert!(run_script("print(x)").is_err());
    }

    #[tokio::test]
    async fn test_pages_and_api() {
        let console = Arc::new(RuntimeConsole::new());
        let site = DemoSite::new(console.clone());

        let home = site.handle(Request::get("/").unwrap()).await;
        assert!(home.contains("FSK demo site"));
        assert!(home.chars().count() >= 50);

        let missing = site.handle(Request::get("/nope?x=1").unwrap()).await;
        assert!(missing.contains("No page at /nope"));

        let out = site
            .handle(Request::post("/api/run", "print(\"a\")\nprint(2)").unwrap())
            .await;
        assert_eq!(out, "a\n2");
        assert_eq!(console.stdout_lines(), 2);

        let err = site
            .handle(Request::post("/api/run", "boom").unwrap())
            .await;
        assert!(err.starts_with("error:"));
        assert_eq!(console.stderr_lines(), 1);
    }
}
