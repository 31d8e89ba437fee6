use crate::benchmark::BenchmarkResolver;
use crate::models::{Direction, Light, Metric, MetricRecord, TrendSignal};

/// Below this fraction of the 200-day average the trend turns red.
pub const TREND_CAUTION_RATIO: f64 = 0.9;
/// A lower-is-better metric at or under benchmark × this is green.
pub const CHEAP_RATIO: f64 = 0.8;
/// A higher-is-better metric at or over benchmark × this is green.
pub const STRONG_RATIO: f64 = 1.2;

/// Price against its own 200-day moving average. Sector plays no part.
pub fn score_trend(price: Option<f64>, moving_average_200d: Option<f64>) -> TrendSignal {
    match (price, moving_average_200d) {
        (Some(p), Some(ma)) if p >= ma => TrendSignal::Green,
        (Some(p), Some(ma)) if p >= TREND_CAUTION_RATIO * ma => TrendSignal::Yellow,
        (Some(_), Some(_)) => TrendSignal::Red,
        _ => TrendSignal::Gray,
    }
}

/// Cell color for a metric against its benchmark. `None` when either is missing.
pub fn traffic_light(value: Option<f64>, benchmark: Option<f64>, direction: Direction) -> Option<Light> {
    let (v, b) = (value?, benchmark?);
    let light = match direction {
        Direction::LowerIsBetter if v <= b * CHEAP_RATIO => Light::Green,
        Direction::LowerIsBetter if v <= b => Light::Yellow,
        Direction::LowerIsBetter => Light::Red,
        Direction::HigherIsBetter if v >= b * STRONG_RATIO => Light::Green,
        Direction::HigherIsBetter if v >= b => Light::Yellow,
        Direction::HigherIsBetter => Light::Red,
    };
    Some(light)
}

/// Green metrics plus one for a green trend, 0..=6.
///
/// A metric whose benchmark cannot be resolved is skipped rather than counted
/// against the stock.
pub fn score_value(record: &MetricRecord, resolver: &BenchmarkResolver) -> u8 {
    let greens = Metric::ALL
        .iter()
        .filter(|&&m| {
            let bench = resolver.resolve(&record.sector, m);
            traffic_light(record.metric(m), bench, m.direction()) == Some(Light::Green)
        })
        .count() as u8;

    let trend = score_trend(record.price, record.moving_average_200d);
    greens + u8::from(trend == TrendSignal::Green)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::{BenchmarkTable, SectorBenchmark};
    use chrono::Utc;

    fn record(sector: &str) -> MetricRecord {
        MetricRecord {
            ticker: "TST.AX".into(),
            sector: sector.into(),
            price: None,
            moving_average_200d: None,
            pe_ratio: None,
            price_to_book: None,
            return_on_equity: None,
            debt_to_equity: None,
            price_to_sales: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_score_trend() {
        assert_eq!(score_trend(Some(100.0), Some(100.0)), TrendSignal::Green);
        assert_eq!(score_trend(Some(95.0), Some(100.0)), TrendSignal::Yellow);
        assert_eq!(score_trend(Some(90.0), Some(100.0)), TrendSignal::Yellow);
        assert_eq!(score_trend(Some(89.99), Some(100.0)), TrendSignal::Red);
        assert_eq!(score_trend(None, Some(100.0)), TrendSignal::Gray);
        assert_eq!(score_trend(Some(100.0), None), TrendSignal::Gray);
    }

    #[test]
    fn test_traffic_light_lower_is_better() {
        let lower = Direction::LowerIsBetter;
        assert_eq!(traffic_light(Some(10.0), Some(15.0), lower), Some(Light::Green));
        assert_eq!(traffic_light(Some(12.0), Some(15.0), lower), Some(Light::Green));
        assert_eq!(traffic_light(Some(13.0), Some(15.0), lower), Some(Light::Yellow));
        assert_eq!(traffic_light(Some(15.0), Some(15.0), lower), Some(Light::Yellow));
        assert_eq!(traffic_light(Some(16.0), Some(15.0), lower), Some(Light::Red));
        assert_eq!(traffic_light(None, Some(15.0), lower), None);
        assert_eq!(traffic_light(Some(10.0), None, lower), None);
    }

    #[test]
    fn test_traffic_light_higher_is_better() {
        let higher = Direction::HigherIsBetter;
        assert_eq!(traffic_light(Some(12.0), Some(10.0), higher), Some(Light::Green));
        assert_eq!(traffic_light(Some(11.0), Some(10.0), higher), Some(Light::Yellow));
        assert_eq!(traffic_light(Some(10.0), Some(10.0), higher), Some(Light::Yellow));
        assert_eq!(traffic_light(Some(9.0), Some(10.0), higher), Some(Light::Red));
    }

    #[test]
    fn test_score_value_pe_point_only_when_green() {
        // Financial Services fallback PE is 15
        let resolver = BenchmarkResolver::static_only();
        let mut r = record("Financial Services");

        r.pe_ratio = Some(10.0);
        assert_eq!(score_value(&r, &resolver), 1);
        r.pe_ratio = Some(13.0);
        assert_eq!(score_value(&r, &resolver), 0);
        r.pe_ratio = Some(16.0);
        assert_eq!(score_value(&r, &resolver), 0);
    }

    #[test]
    fn test_score_value_max_is_six() {
        let resolver = BenchmarkResolver::static_only();
        let mut r = record("Technology");
        r.pe_ratio = Some(10.0);
        r.price_to_book = Some(1.0);
        r.return_on_equity = Some(40.0);
        r.debt_to_equity = Some(2.0);
        r.price_to_sales = Some(1.0);
        r.price = Some(120.0);
        r.moving_average_200d = Some(100.0);
        assert_eq!(score_value(&r, &resolver), 6);
    }

    #[test]
    fn test_missing_value_or_benchmark_is_skipped() {
        let mut dynamic = BenchmarkTable::new();
        dynamic.insert(
            "Shell Companies".into(),
            SectorBenchmark {
                pb: Some(2.0),
                ..Default::default()
            },
        );
        let resolver = BenchmarkResolver::new(dynamic);

        let mut r = record("Shell Companies");
        r.pe_ratio = Some(0.1); // no PE benchmark anywhere for this sector
        r.price_to_book = Some(1.0);
        assert_eq!(score_value(&r, &resolver), 1);

        let mut r = record("Energy");
        r.pe_ratio = None;
        r.price = Some(50.0);
        r.moving_average_200d = Some(40.0);
        assert_eq!(score_value(&r, &resolver), 1);
    }
}
