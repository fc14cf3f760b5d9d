use std::io::ErrorKind;

use anyhow::{Result, bail};
use serde_json::{Value, json};

use super::{count, lines_param, tail};
use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
use crate::registry::{Arguments, RegistryError, ToolRegistry};

pub fn head_and_tail(path: &str, text: &str, n: usize) -> Value {
    let all: Vec<&str> = text.lines().collect();
    json!({
        "path": path,
        "total_lines": all.len(),
        "head": &all[..n.min(all.len())],
        "tail": tail(&all, n),
    })
}

pub(super) fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(
        ToolDescriptor::new("view_file", "View the first and last N lines of a file")
            .param(ParamSpec::required("path", ParamType::String))
            .param(lines_param(20)),
        |args: Arguments| async move {
            let path = args.string("path")?;
            let n = count(&args, "lines")?;
            let text = match tokio::fs::read(path).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) if e.kind() == ErrorKind::NotFound => bail!("File not found: {path}"),
                Err(e) => bail!("Cannot read {path}: {e}"),
            };
            anyhow::Ok(head_and_tail(path, &text, n))
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_files_overlap() {
        let v = head_and_tail("/x", "a\nb\nc\n", 2);
        assert_eq!(v["total_lines"], 3);
        assert_eq!(v["head"], json!(["a", "b"]));
        assert_eq!(v["tail"], json!(["b", "c"]));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let mut r = ToolRegistry::new();
        register(&mut r).unwrap();
        let mut args = serde_json::Map::new();
        args.insert("path".into(), json!("/definitely/not/here.txt"));
        let result = r.invoke("view_file", args).await;
        assert_eq!(
            result,
            crate::mcp::ToolResult::failure("File not found: /definitely/not/here.txt")
        );
    }
}
