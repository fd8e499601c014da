//! State command: dump the current-state index.

use anyhow::{Context, Result};
use statline_core::{AttributeValue, PlayerId};
use statline_store::Timeline;

use crate::Config;

pub fn run(config: &Config, player: &PlayerId, json: bool) -> Result<()> {
    let timeline = Timeline::open(&config.timeline_dir, player)
        .with_context(|| format!("failed to open timeline for {player}"))?;

    let mut rows: Vec<_> = timeline.current_state().iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    if json {
        let map: serde_json::Map<String, serde_json::Value> = rows
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    AttributeValue::Present(s) => serde_json::Value::String(s.clone()),
                    AttributeValue::Absent => serde_json::Value::Null,
                };
                (key.to_string(), value)
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        for (key, value) in rows {
            println!("{key} = {value}");
        }
    }

    Ok(())
}
