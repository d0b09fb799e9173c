/*!
`tools`: print the operation catalog.

JSON output shape:
{
  "status": "ok",
  "count": 6,
  "tools": [
    { "name": "list_assets", "description": "...", "inputSchema": { ... } }
  ]
}
*/

use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};

use crate::ops::Operation;
use crate::ops::schema::{ParamSpec, input_schema};

#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_tools(args: ToolsArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&catalog_json())?);
    } else {
        print!("{}", render_text());
    }
    Ok(())
}

fn catalog_json() -> Value {
    let tools: Vec<Value> = Operation::variants()
        .iter()
        .map(|op| {
            let d = op.descriptor();
            json!({
                "name": d.name,
                "description": d.description,
                "inputSchema": input_schema(d.params),
            })
        })
        .collect();
    json!({
        "status": "ok",
        "count": tools.len(),
        "tools": tools,
    })
}

fn render_text() -> String {
    let mut out = format!("Tools ({})\n", Operation::variants().len());
    for op in Operation::variants() {
        let d = op.descriptor();
        out.push_str(&format!("\n{}\n  {}\n", d.name, d.description));
        if d.params.is_empty() {
            out.push_str("  (no parameters)\n");
            continue;
        }
        let width = d.params.iter().map(|p| p.name.len()).max().unwrap_or(0);
        for p in d.params {
            out.push_str(&format!(
                "  {:<width$}  {}  {}\n",
                p.name,
                p.type_label(),
                requirement(p)
            ));
        }
    }
    out
}

fn requirement(p: &ParamSpec) -> String {
    match (p.required, p.default) {
        (true, _) => "required".into(),
        (false, Some(d)) => format!("default {}", d.to_json()),
        (false, None) => "optional".into(),
    }
}
