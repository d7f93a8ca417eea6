use crate::cli::CliContext;
use crate::constants;
use crate::core::index::DirectoryIndex;
use crate::models::node::{NodeKind, StoreNode};
use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct LsArgs {
    /// Folder to list (default: store root)
    #[arg(default_value = "")]
    pub dir: String,

    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Output format: text|json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Search term (at least 3 characters; shorter terms list everything)
    pub term: String,
}

#[derive(Serialize)]
struct LsItem {
    name: String,
    kind: NodeKind,
}

pub fn run_ls(ctx: &CliContext, args: LsArgs) -> Result<()> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }
    let store = ctx.open_store(false)?;
    let children = store
        .list(&args.dir)
        .with_context(|| format!("list '{}'", args.dir))?;

    let mut items = Vec::new();
    for child in children.iter()? {
        let child = child?;
        items.push(LsItem {
            name: child.name,
            kind: child.kind,
        });
    }
    items.sort_by(|a, b| {
        (a.kind == NodeKind::Leaf, &a.name).cmp(&(b.kind == NodeKind::Leaf, &b.name))
    });

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&items).context("serialize list")?;
        println!("{}", json);
        return Ok(());
    }

    if items.is_empty() {
        println!("No entries found");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
    ]);
    for item in items {
        let kind = match item.kind {
            NodeKind::Branch => "folder",
            NodeKind::Leaf => "entry",
        };
        table.add_row(vec![item.name, kind.to_string()]);
    }
    println!("{}", table);
    Ok(())
}

pub fn run_tree(ctx: &CliContext, args: TreeArgs) -> Result<()> {
    if args.format != "text" && args.format != "json" {
        bail!("invalid format: {} (use text|json)", args.format);
    }
    let index = build_index(ctx)?;
    if args.format == "json" {
        let json = serde_json::to_string_pretty(&index.tree).context("serialize tree")?;
        println!("{}", json);
        return Ok(());
    }
    let mut out = String::new();
    render_tree(&index.tree, "", &mut out);
    print!("{}", out);
    println!("{} entries", index.len());
    Ok(())
}

pub fn run_find(ctx: &CliContext, args: FindArgs) -> Result<()> {
    let index = build_index(ctx)?;
    let results = match index.search(&args.term) {
        Some(results) => results,
        None => {
            eprintln!(
                "note: search needs {} or more characters, listing everything",
                constants::MIN_SEARCH_LEN
            );
            index.flat.clone()
        }
    };
    if results.is_empty() {
        println!("No matches");
    }
    for leaf in results {
        println!("{}", leaf.name);
    }
    Ok(())
}

fn build_index(ctx: &CliContext) -> Result<DirectoryIndex> {
    let cfg = ctx.store_config(false)?;
    DirectoryIndex::build(&cfg.store_root, &cfg.suffix)
        .with_context(|| format!("index store {}", cfg.store_root.display()))
}

fn render_tree(nodes: &[StoreNode], prefix: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(node.label());
        if let StoreNode::Branch(b) = node {
            out.push_str("/\n");
            render_tree(&b.children, &format!("{}{}", prefix, indent), out);
        } else {
            out.push('\n');
        }
    }
}
