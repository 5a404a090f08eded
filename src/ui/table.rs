use tabled::{settings::Style, Table, Tabled};
use crate::source::Source;
use crate::storage::StoreStats;

#[derive(Tabled)]
pub struct SourceRow {
    #[tabled(rename = "Id")]
    pub id: i64,
    #[tabled(rename = "Filename")]
    pub filename: String,
    #[tabled(rename = "Bytes")]
    pub bytes: usize,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

#[derive(Tabled)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub fn sources_table(sources: &[Source]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let rows: Vec<SourceRow> = sources
        .iter()
        .map(|s| SourceRow {
            id: s.id,
            filename: s.filename.clone(),
            bytes: s.size(),
            updated: s.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &StoreStats) -> String {
    let rows = vec![
        MetricRow {
            metric: "Sources".to_string(),
            value: stats.sources.to_string(),
        },
        MetricRow {
            metric: "Content bytes".to_string(),
            value: stats.total_bytes.to_string(),
        },
        MetricRow {
            metric: "Last update".to_string(),
            value: stats
                .last_updated
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
        },
    ];

    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_sources_table_lists_filenames() {
        let now = Utc::now();
        let sources = vec![Source {
            id: 7,
            filename: "modules/net/main.tf".to_string(),
            content: "module {}".to_string(),
            created_at: now,
            updated_at: now,
        }];

        let table = sources_table(&sources);
        assert!(table.contains("modules/net/main.tf"));
        assert!(table.contains("Filename"));
        assert!(sources_table(&[]).is_empty());
    }

    #[test]
    fn test_stats_table_on_empty_store() {
        let stats = StoreStats {
            sources: 0,
            total_bytes: 0,
            last_updated: None,
        };
        assert!(stats_table(&stats).contains("never"));
    }
}
