// src/report.rs
//! Daily report email sent after a scheduled run. Reporting is optional:
//! without `SMTP_HOST` in the environment the sender is disabled and runs
//! proceed silently.

use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use crate::error::HarvestError;
use crate::types::RunSummary;

pub struct ReportSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl ReportSender {
    /// `Ok(None)` when `SMTP_HOST` is unset (reporting disabled); an error
    /// only when the reporting env is present but malformed.
    pub fn from_env() -> Result<Option<Self>, HarvestError> {
        let Ok(host) = std::env::var("SMTP_HOST") else {
            return Ok(None);
        };
        let user = require_env("SMTP_USER")?;
        let pass = require_env("SMTP_PASS")?;
        let from_addr = require_env("REPORT_EMAIL_FROM")?;
        let to_addr = require_env("REPORT_EMAIL_TO")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .map_err(|e| HarvestError::config(format!("invalid SMTP_HOST: {e}")))?
            .credentials(creds)
            .build();

        let from = from_addr
            .parse()
            .map_err(|e| HarvestError::config(format!("invalid REPORT_EMAIL_FROM: {e}")))?;
        let to = to_addr
            .parse()
            .map_err(|e| HarvestError::config(format!("invalid REPORT_EMAIL_TO: {e}")))?;

        Ok(Some(Self { mailer, from, to }))
    }

    pub async fn send_daily_report(&self, summary: &RunSummary) -> Result<()> {
        let subject = format!(
            "Harvest report {}: {}/{} stored",
            summary.date, summary.today_total, summary.target
        );

        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(format_report(summary))
            .context("build report email")?;

        self.mailer.send(msg).await.context("send report email")?;
        Ok(())
    }
}

fn require_env(name: &str) -> Result<String, HarvestError> {
    std::env::var(name).map_err(|_| HarvestError::config(format!("missing env var {name}")))
}

pub fn format_report(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Collection date: {}\n", summary.date));
    out.push_str(&format!(
        "Stored today: {}/{}\n",
        summary.today_total, summary.target
    ));
    out.push_str(&format!(
        "This run: fetched {}, processed {}, stored {} ({} API calls, {:.1}s)\n",
        summary.total_fetched,
        summary.total_processed,
        summary.total_stored,
        summary.api_calls,
        summary.duration_secs
    ));

    if !summary.by_source.is_empty() {
        out.push_str("\nBy source:\n");
        for (source, count) in &summary.by_source {
            out.push_str(&format!("  {source}: {count}\n"));
        }
    }

    if !summary.errors.is_empty() {
        out.push_str(&format!("\nErrors ({}):\n", summary.errors.len()));
        for e in summary.errors.iter().take(10) {
            out.push_str(&format!("  - {e}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn report_lists_sources_and_errors() {
        let summary = RunSummary {
            session_id: "s1".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            duration_secs: 42.5,
            total_fetched: 300,
            total_processed: 180,
            total_stored: 180,
            api_calls: 32,
            today_total: 195,
            target: 200,
            by_source: vec![("ChatGPT".into(), 45), ("NLP".into(), 8)],
            errors: vec!["fetch failed for LocalLLaMA/hot: 503".into()],
        };
        let text = format_report(&summary);
        assert!(text.contains("195/200"));
        assert!(text.contains("ChatGPT: 45"));
        assert!(text.contains("Errors (1):"));
    }
}
