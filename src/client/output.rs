use crate::domain::prediction::PredictionRecord;
use crate::repo::history_repo::to_indented_json;
use console::style;
use std::fmt::Display;
use tabled::settings::Style as TableStyle;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Tabled)]
pub struct PredictionRow {
    #[tabled(rename = "id")]
    pub id: u64,
    #[tabled(rename = "timestamp")]
    pub timestamp: String,
    #[tabled(rename = "age")]
    pub age: i64,
    #[tabled(rename = "ad spend")]
    pub ad_spend: f64,
    #[tabled(rename = "ctr")]
    pub click_through_rate: f64,
    #[tabled(rename = "visits")]
    pub website_visits: i64,
    #[tabled(rename = "time on site")]
    pub time_on_site: f64,
    #[tabled(rename = "gender")]
    pub gender: &'static str,
    #[tabled(rename = "channel")]
    pub channel: &'static str,
    #[tabled(rename = "prediction")]
    pub prediction: i64,
    #[tabled(rename = "probability")]
    pub probability: String,
}

impl From<&PredictionRecord> for PredictionRow {
    fn from(r: &PredictionRecord) -> Self {
        let input = &r.input;
        Self {
            id: r.id,
            timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            age: input.age,
            ad_spend: input.ad_spend,
            click_through_rate: input.click_through_rate,
            website_visits: input.website_visits,
            time_on_site: input.time_on_site,
            gender: if input.gender_male == 1 { "male" } else { "female" },
            channel: channel_label(r),
            prediction: r.prediction,
            probability: format!("{:.4}", r.probability),
        }
    }
}

fn channel_label(r: &PredictionRecord) -> &'static str {
    let i = &r.input;
    match (i.channel_ppc, i.channel_referral, i.channel_seo, i.channel_social_media) {
        (1, 0, 0, 0) => "PPC",
        (0, 1, 0, 0) => "Referral",
        (0, 0, 1, 0) => "SEO",
        (0, 0, 0, 1) => "Social Media",
        (0, 0, 0, 0) => "-",
        _ => "mixed",
    }
}

pub fn render_table(records: &[PredictionRecord]) -> String {
    let rows: Vec<PredictionRow> = records.iter().map(PredictionRow::from).collect();
    Table::new(rows).with(TableStyle::rounded()).to_string()
}

/// Serialized history as written by `download`: four-space indented JSON.
pub fn history_json(records: &[PredictionRecord]) -> anyhow::Result<String> {
    Ok(String::from_utf8(to_indented_json(records)?)?)
}

pub fn print_history(records: &[PredictionRecord], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            if records.is_empty() {
                info("history is empty");
            } else {
                println!("{}", render_table(records));
            }
        }
        OutputFormat::Json => println!("{}", history_json(records)?),
    }
    Ok(())
}

pub fn print_record(record: &PredictionRecord, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_table(std::slice::from_ref(record))),
        OutputFormat::Json => println!("{}", String::from_utf8(to_indented_json(record)?)?),
    }
    Ok(())
}

pub fn print_prediction(record: &PredictionRecord) {
    success(format!(
        "prediction: {} (probability: {})",
        record.prediction, record.probability
    ));
    println!("{} {}", style("id:").dim(), record.id);
}

pub fn success(msg: impl Display) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn error(msg: impl Display) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

pub fn info(msg: impl Display) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
