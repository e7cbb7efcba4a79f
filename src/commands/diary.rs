use std::path::Path;

use anyhow::Context;
use comfy_table::Cell;
use console::style;

use plant_triage_core::diagnosis::HealthBand;
use plant_triage_core::{DiaryEntry, DiaryStore};
use plant_triage_core::imaging::decode_base64;

use super::diagnose::{score_cell, table};
use crate::helpers::fs::write_new_file;

fn entry_score(entry: &DiaryEntry) -> Cell {
    score_cell(entry.health_score, HealthBand::from_score(entry.health_score))
}

pub(crate) fn list(diary: &DiaryStore) -> anyhow::Result<()> {
    if diary.is_empty() {
        println!("The diary is empty. Run `plant-triage diagnose` to add a check-up.");
        return Ok(());
    }

    let mut summary = table(&["ID", "Date", "Health", "Insight"]);
    for entry in diary.newest_first() {
        summary.add_row(vec![
            Cell::new(&entry.id),
            Cell::new(&entry.date),
            entry_score(entry),
            Cell::new(&entry.insight),
        ]);
    }
    println!("{summary}");
    println!("{} entries", diary.len());

    Ok(())
}

pub(crate) fn show(diary: &DiaryStore, id: &str, save_image: Option<&Path>) -> anyhow::Result<()> {
    let entry = diary
        .find(id)
        .with_context(|| format!("No diary entry with id `{id}`"))?;

    println!("{} {}", style("Check-up from").bold(), entry.date);
    let mut details = table(&["Health", "Insight"]);
    details.add_row(vec![entry_score(entry), Cell::new(&entry.insight)]);
    println!("{details}");

    if let Some(path) = save_image {
        let bytes = decode_base64(&entry.image_base64).context("Stored photo is corrupt")?;
        write_new_file(path, &bytes)?;
        println!("Photo written to {}", path.display());
    }

    Ok(())
}
