//! List catalog sequences, intro, and cards.

use flipstage_common::config::StageConfig;
use flipstage_sequence_model::card::cards_from_config;
use flipstage_sequence_model::catalog::SequenceCatalog;

pub fn run(config: &StageConfig) -> anyhow::Result<()> {
    let catalog = SequenceCatalog::from_config(config)
        .map_err(|e| anyhow::anyhow!("Invalid catalog: {e}"))?;

    let base = if catalog.base_path().is_empty() {
        "(root)"
    } else {
        catalog.base_path()
    };
    println!("Catalog: {} sequence(s), base path {}", catalog.len(), base);
    for entry in catalog.entries() {
        println!(
            "  {:<20} start {:>4}  first frame {}",
            entry.id.as_str(),
            entry.start_frame,
            catalog.locator(&entry.id, entry.start_frame)
        );
    }
    println!();

    println!("Intro:");
    println!("  Idle:       {}", config.intro.idle_sequence);
    println!("  Transition: {}", config.intro.transition_sequence);
    println!("  Frame rate: {} fps", config.intro.frame_rate);
    println!();

    let cards = cards_from_config(config, &catalog)
        .map_err(|e| anyhow::anyhow!("Invalid cards: {e}"))?;
    println!(
        "Cards: {} at {} fps",
        cards.len(),
        config.playback.card_frame_rate
    );
    for (i, card) in cards.iter().enumerate() {
        println!(
            "  [{i}] {} ({}, {}) -> {}",
            card.title, card.description, card.date, card.sequence
        );
    }

    Ok(())
}
