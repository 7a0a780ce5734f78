//! Confirmation prompts.

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};

use refgen_core::commands::RemovePlan;

/// Question asked before removing `plan`: a plain confirm for one item, a
/// count for several.
pub fn removal_prompt(plan: &RemovePlan) -> String {
    match plan.items.as_slice() {
        [item] => format!("Remove {}?", item.target),
        items => format!("Removing {} assets. Proceed?", items.len()),
    }
}

pub fn confirm_removal(plan: &RemovePlan) -> Result<bool> {
    if plan.items.len() > 1 {
        for item in &plan.items {
            println!("  {} {}", style(&item.target).bold(), item.path.display());
        }
    }
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(removal_prompt(plan))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use refgen_core::commands::RemoveItem;
    use refgen_core::registry::AssetRef;
    use std::path::PathBuf;

    fn item(asset: &str) -> RemoveItem {
        RemoveItem {
            target: AssetRef::with_default_tag("hg38", asset),
            path: PathBuf::from(format!("/g/hg38/{asset}/default")),
            asset_dir: PathBuf::from(format!("/g/hg38/{asset}/default")),
            archive: PathBuf::from(format!("/g/hg38/{asset}/default.zip")),
        }
    }

    #[test]
    fn single_item_names_the_asset() {
        let plan = RemovePlan {
            items: vec![item("fasta")],
            missing: vec![],
        };
        assert_eq!(removal_prompt(&plan), "Remove hg38/fasta:default?");
    }

    #[test]
    fn several_items_are_counted() {
        let plan = RemovePlan {
            items: vec![item("fasta"), item("bowtie2_index"), item("bwa_index")],
            missing: vec![],
        };
        assert_eq!(removal_prompt(&plan), "Removing 3 assets. Proceed?");
    }
}
