//! Interactive navigation over the store, backed by the store worker.

use crate::cli::entry::entry_table;
use crate::cli::CliContext;
use crate::core::index::{DirectoryIndex, Navigator};
use crate::core::worker::StoreWorker;
use crate::models::node::{Leaf, StoreNode};
use anyhow::{bail, Context, Result};
use clap::Args;
use dialoguer::{Confirm, Input, Select};

#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Start with this search term instead of the top folder
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Open(usize),
    Search,
    Back,
    Sync,
    Quit,
}

fn menu(nav: &Navigator) -> (Vec<String>, Vec<Action>) {
    let mut labels = Vec::new();
    let mut actions = Vec::new();
    for (i, node) in nav.view().iter().enumerate() {
        labels.push(match node {
            StoreNode::Branch(b) => format!("{}/", b.name),
            StoreNode::Leaf(l) => l.name.clone(),
        });
        actions.push(Action::Open(i));
    }
    labels.push("[search]".into());
    actions.push(Action::Search);
    if nav.depth() > 0 {
        labels.push("[back]".into());
        actions.push(Action::Back);
    }
    labels.push("[sync]".into());
    actions.push(Action::Sync);
    labels.push("[quit]".into());
    actions.push(Action::Quit);
    (labels, actions)
}

pub fn run(ctx: &CliContext, args: BrowseArgs) -> Result<()> {
    if ctx.non_interactive {
        bail!("browse is interactive; use ls, find or show instead");
    }
    let store = ctx.open_store(true)?;
    let sync = ctx.sync_coordinator(store.config());
    let worker = StoreWorker::spawn(store, sync)?;

    let mut index = worker.index().wait().context("index store")?;
    let mut nav = Navigator::new(index.tree.clone());
    if let Some(term) = &args.search {
        nav.search(term, &index.flat);
    }

    loop {
        let (labels, actions) = menu(&nav);
        let choice = Select::new()
            .with_prompt("passbook")
            .items(&labels)
            .default(0)
            .interact_opt()
            .context("read selection")?;
        let action = match choice.and_then(|i| actions.get(i).copied()) {
            Some(action) => action,
            // Escape goes up a level, or leaves at the top.
            None if nav.depth() > 0 => Action::Back,
            None => Action::Quit,
        };

        match action {
            Action::Open(i) => {
                if let Some(leaf) = nav.enter(i) {
                    if show_leaf(ctx, &worker, leaf)? {
                        index = refresh(&worker)?;
                        nav.reset(index.tree.clone());
                    }
                }
            }
            Action::Search => {
                let term: String = Input::new()
                    .with_prompt("Search (empty to go back)")
                    .allow_empty(true)
                    .interact_text()
                    .context("read search term")?;
                nav.search(term.trim(), &index.flat);
            }
            Action::Back => {
                nav.back();
            }
            Action::Sync => {
                let _lock = ctx.lock()?;
                match worker.sync().wait() {
                    Ok(session) if session.offline => println!("Offline: remote skipped"),
                    Ok(_) => println!("Synced"),
                    Err(e) => eprintln!("sync failed: {}", e),
                }
                // The worker rebuilds its index even when offline.
                index = refresh(&worker)?;
                nav.reset(index.tree.clone());
            }
            Action::Quit => break,
        }
    }
    Ok(())
}

fn refresh(worker: &StoreWorker) -> Result<DirectoryIndex> {
    worker.index().wait().context("refresh index")
}

/// Show one entry. Returns true when it was deleted.
fn show_leaf(ctx: &CliContext, worker: &StoreWorker, leaf: Leaf) -> Result<bool> {
    let entry = match worker.read(leaf.clone()).wait() {
        Ok(entry) => entry,
        Err(e) if e.is_not_found() => {
            eprintln!("{} no longer exists", leaf.name);
            return Ok(true);
        }
        Err(e) => {
            eprintln!("cannot read {}: {}", leaf.name, e);
            return Ok(false);
        }
    };
    let mut reveal = false;
    loop {
        println!("{}", entry_table(&entry, reveal));
        let toggle = if reveal { "Hide password" } else { "Reveal password" };
        let choice = Select::new()
            .with_prompt(leaf.name.as_str())
            .items(&[toggle, "Delete", "Back"])
            .default(2)
            .interact_opt()
            .context("read selection")?;
        match choice {
            Some(0) => reveal = !reveal,
            Some(1) => {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete {}?", leaf.name))
                    .default(false)
                    .interact()
                    .context("read confirmation")?;
                if confirmed {
                    let _lock = ctx.lock()?;
                    worker
                        .delete(leaf.clone())
                        .wait()
                        .with_context(|| format!("delete entry '{}'", leaf.name))?;
                    println!("Deleted {}", leaf.name);
                    return Ok(true);
                }
            }
            _ => return Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::Branch;
    use std::path::PathBuf;

    #[test]
    fn test_menu_lists_nodes_then_actions() {
        let nav = Navigator::new(vec![
            StoreNode::Branch(Branch {
                name: "work".into(),
                path: PathBuf::from("/s/work"),
                children: Vec::new(),
            }),
            StoreNode::Leaf(Leaf::new("github", "/s/github.gpg")),
        ]);
        let (labels, actions) = menu(&nav);
        assert_eq!(labels, vec!["work/", "github", "[search]", "[sync]", "[quit]"]);
        assert_eq!(actions[1], Action::Open(1));
    }

    #[test]
    fn test_menu_offers_back_below_top() {
        let mut nav = Navigator::new(vec![StoreNode::Branch(Branch {
            name: "work".into(),
            path: PathBuf::from("/s/work"),
            children: Vec::new(),
        })]);
        nav.enter(0);
        let (labels, actions) = menu(&nav);
        assert!(labels.contains(&"[back]".to_string()));
        assert!(actions.contains(&Action::Back));
    }
}
