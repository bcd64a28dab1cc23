//! Kanji table lookup against the hosted PostgREST API.

use std::time::Duration;

use anyhow::{bail, Context};
use clap::Args;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Args)]
pub struct KanjiArgs {
    /// Number of rows to fetch
    #[arg(long, default_value_t = 5)]
    pub limit: u32,

    /// Project URL, e.g. https://xyz.supabase.co
    #[arg(long, env = "SUPABASE_URL")]
    pub url: String,

    /// Anonymous API key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub anon_key: String,
}

/// One row of the `kanji` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KanjiRow {
    pub id: i64,
    pub character: String,
    #[serde(default)]
    pub jlpt: Option<i64>,
    #[serde(default)]
    pub grade: Option<i64>,
}

/// Minimal read-only PostgREST client.
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("qreel-tools/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    /// Fetch the first `limit` rows.
    pub async fn list_kanji(&self, limit: u32) -> anyhow::Result<Vec<KanjiRow>> {
        let url = kanji_url(&self.base_url, limit);
        debug!(url = %url, "Querying kanji table");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await
            .context("Kanji request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Kanji query failed with {}: {}", status, body);
        }

        response
            .json::<Vec<KanjiRow>>()
            .await
            .context("Invalid kanji response")
    }
}

/// PostgREST query for the first `limit` kanji rows.
pub fn kanji_url(base_url: &str, limit: u32) -> String {
    format!(
        "{}/rest/v1/kanji?select=id,character,jlpt,grade&limit={}",
        base_url.trim_end_matches('/'),
        limit
    )
}

/// Render rows as a fixed-width table.
pub fn format_table(rows: &[KanjiRow]) -> String {
    let cell = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());

    let mut out = format!("{:>6}  {:<4}  {:>4}  {:>5}\n", "id", "kanji", "jlpt", "grade");
    for row in rows {
        out.push_str(&format!(
            "{:>6}  {:<4}  {:>4}  {:>5}\n",
            row.id,
            row.character,
            cell(row.jlpt),
            cell(row.grade)
        ));
    }
    out
}

pub async fn run(args: KanjiArgs) -> anyhow::Result<()> {
    let client = SupabaseClient::new(&args.url, args.anon_key)?;
    let rows = client.list_kanji(args.limit).await?;

    if rows.is_empty() {
        println!("No rows");
    } else {
        print!("{}", format_table(&rows));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kanji_url() {
        assert_eq!(
            kanji_url("https://xyz.supabase.co/", 5),
            "https://xyz.supabase.co/rest/v1/kanji?select=id,character,jlpt,grade&limit=5"
        );
    }

    #[test]
    fn test_rows_deserialize() {
        let rows: Vec<KanjiRow> = serde_json::from_str(
            r#"[{"id": 1, "character": "日", "jlpt": 5, "grade": 1},
                {"id": 2, "character": "勉", "jlpt": null}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].jlpt, Some(5));
        assert_eq!(rows[1].grade, None);
    }

    #[test]
    fn test_format_table() {
        let rows = vec![KanjiRow {
            id: 7,
            character: "強".to_string(),
            jlpt: Some(4),
            grade: None,
        }];
        let table = format_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("kanji"));
        assert!(lines[1].contains('強'));
        assert!(lines[1].trim_end().ends_with('-'));
    }
}
