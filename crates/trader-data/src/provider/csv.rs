//! CSV 파일 기반 데이터 로더.
//!
//! 가격 파일: `date,close` (헤더 선택)
//! 펀더멘털 파일: `date,metric,value` (헤더 선택)

use super::{BenchmarkProvider, PriceSeriesProvider};
use super::memory::InMemoryFundamentalProvider;
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use trader_core::{PricePoint, PriceSeries};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `<dir>/<ASSET>.csv` 파일에서 가격을 읽는 Provider.
#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    dir: PathBuf,
}

impl CsvPriceProvider {
    /// 데이터 디렉토리로 Provider를 생성합니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 자산 파일 경로.
    pub fn path_for(&self, asset_id: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", asset_id))
    }
}

impl PriceSeriesProvider for CsvPriceProvider {
    fn get_prices(&self, asset_id: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let path = self.path_for(asset_id);
        if !path.exists() {
            return Err(DataError::NotFound(format!(
                "{} ({})",
                asset_id,
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        let points = parse_price_csv(&content)?;
        let series = PriceSeries::new(points);
        debug!(asset = asset_id, rows = series.len(), "가격 CSV 로드");

        Ok(PriceSeries::new(series.between(start, end).to_vec()))
    }
}

impl BenchmarkProvider for CsvPriceProvider {
    fn get_benchmark(
        &self,
        benchmark_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        self.get_prices(benchmark_id, start, end)
    }
}

fn is_header(line_no: usize, line: &str) -> bool {
    line_no == 0 && line.to_lowercase().contains("date")
}

fn parse_date(raw: &str, line_no: usize) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
        DataError::ParseError(format!("Invalid date at line {}: {}", line_no + 1, e))
    })
}

fn parse_decimal(raw: &str, line_no: usize) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| {
        DataError::ParseError(format!("Invalid number at line {}: {}", line_no + 1, e))
    })
}

/// 가격 CSV 내용을 파싱합니다.
///
/// 빈 줄은 건너뜁니다. 종가가 0 이하인 행은 오류입니다.
pub fn parse_price_csv(content: &str) -> Result<Vec<PricePoint>> {
    let mut points = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() || is_header(line_no, line) {
            continue;
        }

        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 2 {
            return Err(DataError::InvalidData(format!(
                "Expected date,close at line {}",
                line_no + 1
            )));
        }

        let date = parse_date(parts[0], line_no)?;
        let close = parse_decimal(parts[1], line_no)?;
        if close <= Decimal::ZERO {
            return Err(DataError::InvalidData(format!(
                "Non-positive close at line {}: {}",
                line_no + 1,
                close
            )));
        }

        points.push(PricePoint::new(date, close));
    }

    Ok(points)
}

/// 펀더멘털 CSV 내용을 파싱하여 Provider에 추가합니다.
pub fn parse_fundamental_csv(
    asset_id: &str,
    content: &str,
    provider: &mut InMemoryFundamentalProvider,
) -> Result<usize> {
    let mut rows = 0;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() || is_header(line_no, line) {
            continue;
        }

        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 3 {
            return Err(DataError::InvalidData(format!(
                "Expected date,metric,value at line {}",
                line_no + 1
            )));
        }

        let date = parse_date(parts[0], line_no)?;
        let metric = parts[1].trim().to_lowercase();
        let value = parse_decimal(parts[2], line_no)?;
        provider.insert_metric(asset_id, date, metric, value);
        rows += 1;
    }

    Ok(rows)
}

/// 디렉토리의 모든 `<ASSET>.csv` 펀더멘털 파일을 읽습니다.
///
/// 디렉토리가 없으면 빈 Provider를 반환합니다.
pub fn load_fundamentals_dir(dir: impl AsRef<Path>) -> Result<InMemoryFundamentalProvider> {
    let mut provider = InMemoryFundamentalProvider::new();
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(provider);
    }

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(asset_id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let content = std::fs::read_to_string(&path)?;
        let rows = parse_fundamental_csv(asset_id, &content, &mut provider)?;
        debug!(asset = asset_id, rows, "펀더멘털 CSV 로드");
    }

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FundamentalProvider;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_price_csv_with_header() {
        let content = "date,close\n2024-01-02,100.5\n\n2024-01-03,101\n";
        let points = parse_price_csv(content).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close, dec!(100.5));
    }

    #[test]
    fn test_parse_price_csv_rejects_bad_rows() {
        assert!(parse_price_csv("2024-01-02").is_err());
        assert!(parse_price_csv("2024/01/02,100").is_err());
        assert!(parse_price_csv("2024-01-02,abc").is_err());
        assert!(parse_price_csv("2024-01-02,0").is_err());
    }

    #[test]
    fn test_csv_provider_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("SPY.csv"),
            "date,close\n2024-01-02,100\n2024-01-03,101\n2024-01-04,102\n",
        )
        .unwrap();

        let provider = CsvPriceProvider::new(dir.path());
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let series = provider.get_prices("SPY", start, end).unwrap();
        assert_eq!(series.len(), 2);

        let err = provider.get_prices("QQQ", start, end).unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_load_fundamentals_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("005930.csv"),
            "date,metric,value\n2023-03-31,PER,11.5\n2023-03-31,pbr,1.2\n",
        )
        .unwrap();

        let provider = load_fundamentals_dir(dir.path()).unwrap();
        let as_of = NaiveDate::from_ymd_opt(2023, 4, 1).unwrap();
        let snapshot = provider.get_fundamentals("005930", as_of).unwrap();
        assert_eq!(snapshot.get("per"), Some(&dec!(11.5)));
        assert_eq!(snapshot.get("pbr"), Some(&dec!(1.2)));
    }

    #[test]
    fn test_load_fundamentals_missing_dir() {
        let provider = load_fundamentals_dir("no/such/dir").unwrap();
        assert!(provider.is_empty());
    }
}
