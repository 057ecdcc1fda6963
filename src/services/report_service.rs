use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, MAX_TEAM_ROUNDS};
use crate::errors::{AppError, LlmError};
use crate::external::price_provider::PriceProvider;
use crate::models::{AgentProfile, EditedReport, Message, Period, Persona, PriceBar, ReportPayload};
use crate::services::chart::render_price_chart;
use crate::services::conversation_service::{run_round_robin, Turn};
use crate::services::editor::edit_text;
use crate::services::fallback_report::generate_fallback_report;
use crate::services::llm_service::LlmService;
use crate::services::session_store::SessionStore;
use crate::services::stock_metrics::StockMetrics;

const ACTIVITY_STEPS: [&str; 5] = [
    "🔄 Initializing AI team...",
    "📋 Planner analyzing requirements...",
    "📊 Analyst reviewing price data...",
    "✍️ Writer compiling final report...",
    "✅ Finalizing report...",
];

const REPORT_KEYWORDS: [&str; 4] = ["blog", "report", "analysis", "conclusion"];

const TASK_SPEAKER: &str = "Admin";

// Ticker characters Yahoo accepts, e.g. BRK-B, ^GSPC, EURUSD=X, RY.TO
static TICKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9.^=-]+$").expect("valid regex"));

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockReportRequest {
    /// Falls back to the session's configured symbol.
    pub symbol: Option<String>,
    pub period: Option<Period>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityStep {
    pub step: &'static str,
    pub progress: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockReportOutcome {
    pub task: String,
    pub activity: Vec<ActivityStep>,
    pub transcript: Vec<Turn>,
    pub report: ReportPayload,
}

pub fn report_team() -> Vec<AgentProfile> {
    vec![
        AgentProfile::new(
            "Planner",
            "You are the Planner. Given a task and the price data provided, determine what information \
is needed to complete it and outline the structure of the report. After each contribution by \
others, check progress and instruct the remaining steps.",
        ),
        AgentProfile::new(
            "Analyst",
            "You are the Analyst. Interpret the supplied price statistics: describe the trend, the \
volatility, notable highs and lows, and how the moving averages compare with the latest close. \
Only use the numbers you are given.",
        ),
        AgentProfile::new(
            "Writer",
            "You are the Writer. Create comprehensive blog posts in markdown format. Include relevant \
titles, sections for key statistics, trend analysis, market context, and conclusions. Format the \
content professionally and ensure it's engaging to read.",
        ),
    ]
}

pub fn build_task(symbol: &str, period: Period, series: &[PriceBar], metrics: &StockMetrics) -> String {
    let as_of = series
        .last()
        .map(|b| b.date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    format!(
        "Write a comprehensive blogpost about the stock price performance of {symbol} in the {period}. \
Today's date is {as_of}. Include key statistics, trend analysis, and market context.\n\n\
Price data:\n\
- Latest close: ${latest:.2}\n\
- First close: ${first:.2}\n\
- High: ${high:.2}\n\
- Low: ${low:.2}\n\
- Change: ${change:.2} ({pct:.2}%)\n\
- Average volume: {volume:.0}\n\
- 20-day average close: ${ma20:.2}\n\
- 50-day average close: ${ma50:.2}\n\
- Trading days: {bars}",
        period = period.display(),
        latest = metrics.latest_close,
        first = metrics.first_close,
        high = metrics.high,
        low = metrics.low,
        change = metrics.change,
        pct = metrics.pct_change,
        volume = metrics.avg_volume,
        ma20 = metrics.rolling_mean_20,
        ma50 = metrics.rolling_mean_50,
        bars = metrics.bar_count,
    )
}

/// Newest agent message that reads like a finished report, else the newest
/// agent message. The task itself is never picked.
pub fn pick_final_report(turns: &[Turn]) -> Option<&str> {
    let agent_turns = turns.iter().filter(|t| t.speaker != TASK_SPEAKER);

    agent_turns
        .clone()
        .rev()
        .find(|t| {
            let lower = t.content.to_lowercase();
            REPORT_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .or_else(|| agent_turns.last())
        .map(|t| t.content.as_str())
        .filter(|c| !c.trim().is_empty())
}

async fn run_activity(delay: std::time::Duration) -> Vec<ActivityStep> {
    let mut steps = Vec::with_capacity(ACTIVITY_STEPS.len());
    for (i, &step) in ACTIVITY_STEPS.iter().enumerate() {
        info!("{}", step);
        steps.push(ActivityStep {
            step,
            progress: ((i + 1) * 100 / ACTIVITY_STEPS.len()) as u8,
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    steps
}

/// Fetch → metrics → chart → team narrative (or template) → session.
///
/// A blank symbol or a symbol with no data is rejected before any metric
/// is computed. Every model failure degrades to the templated report.
pub async fn generate_stock_report(
    store: &SessionStore,
    llm: &LlmService,
    prices: &dyn PriceProvider,
    config: &AppConfig,
    session_id: Uuid,
    request: StockReportRequest,
) -> Result<StockReportOutcome, AppError> {
    let (api_key, session_config) = store.read(session_id, |s| (s.api_key.clone(), s.config.clone()))?;

    let symbol = request
        .symbol
        .unwrap_or(session_config.symbol)
        .trim()
        .to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("Please enter a stock symbol".to_string()));
    }
    if !TICKER.is_match(&symbol) {
        return Err(AppError::Validation(format!("Invalid stock symbol: {}", symbol)));
    }
    let period = request.period.unwrap_or(session_config.period);

    info!("Generating stock report for {} ({})", symbol, period);
    let series = prices.fetch_history(&symbol, period).await?;
    let Some(metrics) = StockMetrics::compute(&series) else {
        warn!("No price data for {}", symbol);
        return Err(AppError::NotFound(format!(
            "No data found for symbol {}. Please check the symbol and try again.",
            symbol
        )));
    };

    let chart_svg = render_price_chart(&symbol, &series);
    let task = build_task(&symbol, period, &series, &metrics);
    let activity = run_activity(config.agent_step_delay).await;

    let rounds = config.report_team_rounds.clamp(1, MAX_TEAM_ROUNDS);
    let team_result = run_round_robin(llm, api_key.as_deref(), &report_team(), TASK_SPEAKER, &task, rounds).await;

    let (transcript, narrative, used_fallback) = match team_result {
        Ok(turns) => match pick_final_report(&turns).map(str::to_string) {
            Some(text) => (turns, text, false),
            None => {
                warn!("Team produced no usable report for {}, using template", symbol);
                (turns, fallback_text(&symbol, period, &series)?, true)
            }
        },
        Err(e) => {
            warn!("Team chat failed for {}: {}. Using template", symbol, e);
            (Vec::new(), fallback_text(&symbol, period, &series)?, true)
        }
    };

    let report = ReportPayload::new(symbol.clone(), period, series, narrative, used_fallback, chart_svg)
        .ok_or_else(|| AppError::NotFound(format!("No data found for symbol {}", symbol)))?;

    let message = Message::assistant(Persona::Writer, report.narrative()).with_report(report.clone());
    store.update(session_id, |s| {
        s.config.symbol = symbol.clone();
        s.config.period = period;
        s.report = Some(report.clone());
        s.push(message);
    })?;

    info!("Stock report for {} stored (fallback: {})", symbol, used_fallback);
    Ok(StockReportOutcome { task, activity, transcript, report })
}

fn fallback_text(symbol: &str, period: Period, series: &[PriceBar]) -> Result<String, AppError> {
    generate_fallback_report(symbol, period, series)
        .ok_or_else(|| AppError::NotFound(format!("No data found for symbol {}", symbol)))
}

pub fn current_report(store: &SessionStore, session_id: Uuid) -> Result<ReportPayload, AppError> {
    store
        .read(session_id, |s| s.report.clone())?
        .ok_or_else(|| AppError::NotFound("No stock report has been generated yet".to_string()))
}

/// Runs the editor persona over the stored narrative and attaches the result
/// as the report's edited variant. The original narrative is kept.
pub async fn edit_stock_report(
    store: &SessionStore,
    llm: &LlmService,
    session_id: Uuid,
) -> Result<ReportPayload, AppError> {
    let report = current_report(store, session_id)?;
    let (api_key, tone) = store.read(session_id, |s| (s.api_key.clone(), s.config.tone.clone()))?;

    let topic = format!("{} stock performance", report.symbol());
    let output = edit_text(llm, api_key.as_deref(), &topic, &tone, report.narrative())
        .await
        .map_err(|e: LlmError| {
            warn!("Editing report for {} failed: {}", report.symbol(), e);
            AppError::Llm(e)
        })?;

    let generated_at = report.generated_at();
    let edited = report.with_edit(EditedReport {
        content: output.edited_content,
        feedback: output.feedback.clone(),
        edited_at: Utc::now(),
    });

    store.update(session_id, |s| {
        let unchanged = s.report.as_ref().is_some_and(|r| r.generated_at() == generated_at);
        if !unchanged {
            return Err(AppError::Validation(
                "The report changed while it was being edited, please retry".to_string(),
            ));
        }
        s.report = Some(edited.clone());
        s.push(Message::assistant(Persona::Editor, output.feedback).with_report(edited.clone()));
        Ok(edited)
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::external::price_provider::PriceProviderError;
    use crate::models::SessionConfig;
    use crate::services::llm_service::tests::ScriptedProvider;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct FixedPrices(Vec<PriceBar>);

    #[async_trait]
    impl PriceProvider for FixedPrices {
        async fn fetch_history(&self, _symbol: &str, _period: Period) -> Result<Vec<PriceBar>, PriceProviderError> {
            Ok(self.0.clone())
        }
    }

    fn series() -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 22).unwrap();
        [100.0, 105.0, 98.0, 110.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::flat(start + chrono::Days::new(i as u64), c, 1_000))
            .collect()
    }

    fn setup(replies: Vec<Result<String, LlmError>>) -> (SessionStore, LlmService, Uuid) {
        let store = SessionStore::new();
        let id = store.create(Some("key".into()), SessionConfig::default());
        let llm = LlmService::new(LlmConfig::default(), Arc::new(ScriptedProvider::new(replies)));
        (store, llm, id)
    }

    fn turn(speaker: &str, content: &str) -> Turn {
        Turn { speaker: speaker.into(), content: content.into() }
    }

    #[test]
    fn test_pick_final_report_prefers_report_like_message() {
        let turns = vec![
            turn("Admin", "Write a blogpost"),
            turn("Planner", "First gather numbers"),
            turn("Writer", "# Report\nConclusion: up"),
            turn("Planner", "Looks good"),
        ];
        assert_eq!(pick_final_report(&turns), Some("# Report\nConclusion: up"));

        let plain = vec![turn("Admin", "Write a blogpost"), turn("Planner", "a"), turn("Writer", "b")];
        assert_eq!(pick_final_report(&plain), Some("b"));

        assert_eq!(pick_final_report(&[turn("Admin", "Write a blogpost")]), None);
    }

    #[test]
    fn test_task_mentions_period_and_date() {
        let s = series();
        let m = StockMetrics::compute(&s).unwrap();
        let task = build_task("TTM", Period::ThreeMonths, &s, &m);
        assert!(task.starts_with("Write a comprehensive blogpost about the stock price performance of TTM in the past 3 months."));
        assert!(task.contains("Today's date is 2024-07-25."));
        assert!(task.contains("Change: $10.00 (10.00%)"));
    }

    #[tokio::test]
    async fn test_team_narrative_is_stored() {
        let (store, llm, id) = setup(vec![
            Ok("Plan: cover stats".into()),
            Ok("Trend is up".into()),
            Ok("# AAPL Report\nConclusion".into()),
        ]);
        let config = AppConfig::default();
        let request = StockReportRequest { symbol: Some("aapl".into()), period: None };

        let out = generate_stock_report(&store, &llm, &FixedPrices(series()), &config, id, request)
            .await
            .unwrap();
        assert!(!out.report.used_fallback());
        assert_eq!(out.report.narrative(), "# AAPL Report\nConclusion");
        assert_eq!(out.activity.len(), 5);
        assert_eq!(out.activity.last().unwrap().progress, 100);
        assert_eq!(store.read(id, |s| s.config.symbol.clone()).unwrap(), "AAPL");
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_template() {
        let (store, llm, id) = setup(vec![Err(LlmError::Timeout)]);
        let out = generate_stock_report(
            &store,
            &llm,
            &FixedPrices(series()),
            &AppConfig::default(),
            id,
            StockReportRequest::default(),
        )
        .await
        .unwrap();

        assert!(out.report.used_fallback());
        let expected = generate_fallback_report("TTM", Period::ThreeMonths, &series()).unwrap();
        assert_eq!(out.report.narrative(), expected);
        assert!(store.read(id, |s| s.report.is_some()).unwrap());
    }

    #[tokio::test]
    async fn test_empty_series_aborts_before_report() {
        let (store, llm, id) = setup(vec![]);
        let result = generate_stock_report(
            &store,
            &llm,
            &FixedPrices(Vec::new()),
            &AppConfig::default(),
            id,
            StockReportRequest { symbol: Some("ZZZZ".into()), period: None },
        )
        .await;

        match result {
            Err(AppError::NotFound(msg)) => assert!(msg.contains("No data found for symbol ZZZZ")),
            other => panic!("expected NotFound, got {:?}", other.map(|o| o.task)),
        }
        assert_eq!(store.read(id, |s| (s.report.is_none(), s.messages.len())).unwrap(), (true, 0));
    }

    #[tokio::test]
    async fn test_blank_symbol_rejected() {
        let (store, llm, id) = setup(vec![]);
        let result = generate_stock_report(
            &store,
            &llm,
            &FixedPrices(series()),
            &AppConfig::default(),
            id,
            StockReportRequest { symbol: Some("   ".into()), period: None },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_symbol_with_url_characters_rejected() {
        for bad in ["AAPL?range=max", "AAPL#x", "../AAPL", "AA PL"] {
            let (store, llm, id) = setup(vec![]);
            let result = generate_stock_report(
                &store,
                &llm,
                &FixedPrices(series()),
                &AppConfig::default(),
                id,
                StockReportRequest { symbol: Some(bad.into()), period: None },
            )
            .await;
            assert!(matches!(result, Err(AppError::Validation(_))), "symbol {:?}", bad);
        }
    }

    #[test]
    fn test_ticker_pattern_accepts_index_and_class_symbols() {
        for ok in ["BRK-B", "^GSPC", "EURUSD=X", "RY.TO", "TTM"] {
            assert!(TICKER.is_match(ok), "symbol {:?}", ok);
        }
    }

    #[tokio::test]
    async fn test_edit_attaches_variant_and_keeps_original() {
        let (store, llm, id) = setup(vec![
            Err(LlmError::Timeout),
            Ok(r#"{"edited_content":"Polished","feedback":"Tightened intro"}"#.into()),
        ]);
        generate_stock_report(&store, &llm, &FixedPrices(series()), &AppConfig::default(), id, StockReportRequest::default())
            .await
            .unwrap();

        let edited = edit_stock_report(&store, &llm, id).await.unwrap();
        assert_eq!(edited.best_text(), "Polished");
        assert!(edited.narrative().starts_with("# TTM Stock Performance Analysis"));
        assert_eq!(edited.edited().unwrap().feedback, "Tightened intro");
    }

    #[tokio::test]
    async fn test_edit_without_report_is_not_found() {
        let (store, llm, id) = setup(vec![]);
        assert!(matches!(edit_stock_report(&store, &llm, id).await, Err(AppError::NotFound(_))));
    }
}
