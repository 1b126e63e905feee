use crate::core::alerts::build_alerts;
use crate::core::radar::build_radar;
use crate::core::recommendations::Recommender;
use crate::core::scoring::PACKET_SIZE;
use crate::domain::model::{DashboardView, EventTable, RiskReport};
use crate::domain::ports::RiskScorer;
use crate::utils::error::Result;

/// 依上傳檔案的欄位決定標題：只有 packet_size 沒有 event_type 視為網路流量
pub fn detect_view(input: &EventTable) -> DashboardView {
    if input.has_column(PACKET_SIZE) && !input.has_column("event_type") {
        DashboardView::NetworkTraffic
    } else {
        DashboardView::ScoredEvents
    }
}

/// Scores the table and derives alerts, recommendations and chart data.
pub fn build_report(
    input: EventTable,
    scorer: &dyn RiskScorer,
    threshold: f64,
    recommender: &Recommender,
) -> Result<RiskReport> {
    let view = detect_view(&input);
    let scored = scorer.score(input)?;
    let alerts = build_alerts(&scored, threshold, recommender);
    let radar = build_radar(&scored.to_table());

    tracing::info!(
        "🔎 {} rows scored by {} scorer, {} alerts at threshold {:.2}",
        scored.len(),
        scorer.name(),
        alerts.len(),
        threshold
    );

    Ok(RiskReport {
        scored,
        alerts,
        radar,
        view,
        threshold,
        scorer: scorer.name().to_string(),
        generated_at: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::csv_io::parse_csv;
    use crate::core::scoring::HeuristicScorer;

    #[test]
    fn test_network_view_detection() {
        let network = parse_csv(b"src_ip,dst_ip,packet_size\n10.0.0.1,10.0.0.2,1500\n").unwrap();
        assert_eq!(detect_view(&network), DashboardView::NetworkTraffic);

        let events = parse_csv(b"event_type,packet_size\nmalware,100\n").unwrap();
        assert_eq!(detect_view(&events), DashboardView::ScoredEvents);

        let plain = parse_csv(b"severity\n3\n").unwrap();
        assert_eq!(detect_view(&plain), DashboardView::ScoredEvents);
    }

    #[test]
    fn test_report_on_sample_events() {
        let input = parse_csv(crate::config::bootstrap::SAMPLE_EVENTS_CSV.as_bytes()).unwrap();
        let report = build_report(input, &HeuristicScorer::default(), 0.5, &Recommender::default())
            .unwrap();

        assert_eq!(report.scored.len(), 5);
        assert_eq!(report.view, DashboardView::ScoredEvents);
        assert_eq!(report.scorer, "heuristic");
        assert!(report.alerts.iter().all(|a| a.risk_probability >= 0.5));
        // ransomware 列分數最高
        assert!(report.alerts.iter().any(|a| a.headline.contains("ransomware")));
        let radar = report.radar.unwrap();
        assert!(radar.points.iter().any(|p| p.metric == "risk_probability"));
    }
}
