mod common;

use anyhow::Result;
use common::{expense, income, test_service, ts};
use tally::domain::{format_timestamp, now_local, TransactionKind, YearMonth};

#[tokio::test]
async fn test_monthly_summary_for_current_month() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let now = now_local();
    let stamp = format_timestamp(now);
    income(&service, "工资", 100_000, &stamp).await?;
    expense(&service, "餐饮", 40_000, &stamp).await?;

    let summary = service.monthly_summary(YearMonth::of(now.date())).await?;
    assert_eq!(summary.income, 100_000);
    assert_eq!(summary.expense, 40_000);
    assert_eq!(summary.balance(), 60_000);

    Ok(())
}

#[tokio::test]
async fn test_monthly_summary_defaults_to_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;

    income(&service, "工资", 500_000, "2024-03-15").await?;

    let summary = service
        .monthly_summary(YearMonth::new(2024, 4).unwrap())
        .await?;
    assert_eq!(summary.income, 0);
    assert_eq!(summary.expense, 0);

    Ok(())
}

#[tokio::test]
async fn test_monthly_summary_range_is_half_open() -> Result<()> {
    let (service, _temp) = test_service().await?;

    expense(&service, "餐饮", 100, "2024-11-30 23:59:59").await?;
    expense(&service, "餐饮", 200, "2024-12-01 00:00:00").await?;
    expense(&service, "餐饮", 400, "2024-12-31 23:59:59").await?;
    expense(&service, "餐饮", 800, "2025-01-01 00:00:00").await?;

    let december = YearMonth::new(2024, 12).unwrap();
    let summary = service.monthly_summary(december).await?;
    assert_eq!(summary.expense, 600);

    // December rolls over into January of the following year
    let january = service.monthly_summary(december.next()).await?;
    assert_eq!(january.month, YearMonth::new(2025, 1).unwrap());
    assert_eq!(january.expense, 800);

    let november = service.monthly_summary(december.prev()).await?;
    assert_eq!(november.expense, 100);

    Ok(())
}

#[tokio::test]
async fn test_category_summary_by_kind() -> Result<()> {
    let (service, _temp) = test_service().await?;

    expense(&service, "餐饮", 1500, "2024-01-05").await?;
    expense(&service, "餐饮", 2000, "2024-01-12").await?;
    expense(&service, "交通", 500, "2024-01-10").await?;
    expense(&service, "其他", 300, "2024-01-11").await?;
    income(&service, "工资", 800_000, "2024-01-25").await?;
    income(&service, "其他", 700, "2024-01-26").await?;
    // Outside the month
    expense(&service, "餐饮", 9999, "2024-02-01").await?;

    let month = YearMonth::new(2024, 1).unwrap();
    let report = service
        .category_summary(Some(TransactionKind::Expense), month)
        .await?;

    assert_eq!(report.kind, Some(TransactionKind::Expense));
    assert_eq!(report.total, 4300);
    assert_eq!(report.categories.len(), 3);
    assert_eq!(report.categories[0].category, "餐饮");
    assert_eq!(report.categories[0].total, 3500);
    assert_eq!(report.categories[0].count, 2);
    assert_eq!(report.categories[1].category, "交通");
    assert_eq!(report.categories[2].category, "其他");
    assert_eq!(report.categories[2].total, 300);

    let income_report = service
        .category_summary(Some(TransactionKind::Income), month)
        .await?;
    assert_eq!(income_report.total, 800_700);
    assert_eq!(income_report.categories.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_category_summary_combines_kinds() -> Result<()> {
    let (service, _temp) = test_service().await?;

    expense(&service, "其他", 300, "2024-01-11").await?;
    income(&service, "其他", 700, "2024-01-26").await?;
    expense(&service, "餐饮", 200, "2024-01-12").await?;

    let report = service
        .category_summary(None, YearMonth::new(2024, 1).unwrap())
        .await?;

    assert_eq!(report.kind, None);
    assert_eq!(report.total, 1200);
    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].category, "其他");
    assert_eq!(report.categories[0].total, 1000);
    assert_eq!(report.categories[0].count, 2);
    assert!((report.percentage(&report.categories[1]) - 200.0 * 100.0 / 1200.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn test_daily_total() -> Result<()> {
    let (service, _temp) = test_service().await?;

    expense(&service, "餐饮", 1200, "2024-08-08 08:00:00").await?;
    expense(&service, "交通", 300, "2024-08-08 23:59:59").await?;
    income(&service, "奖金", 5000, "2024-08-08 10:00:00").await?;
    expense(&service, "餐饮", 9900, "2024-08-09 00:00:00").await?;

    let day = ts("2024-08-08").date();
    let spent = service
        .daily_total(day, Some(TransactionKind::Expense))
        .await?;
    assert_eq!(spent.total, 1500);

    let everything = service.daily_total(day, None).await?;
    assert_eq!(everything.total, 6500);

    let quiet = service
        .daily_total(ts("2024-08-07").date(), Some(TransactionKind::Expense))
        .await?;
    assert_eq!(quiet.total, 0);

    Ok(())
}

#[tokio::test]
async fn test_summary_serializes_to_json() -> Result<()> {
    let (service, _temp) = test_service().await?;

    income(&service, "工资", 1000, "2024-02-01").await?;
    let summary = service
        .monthly_summary(YearMonth::new(2024, 2).unwrap())
        .await?;

    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["income"], 1000);
    assert_eq!(json["expense"], 0);
    assert_eq!(json["month"]["year"], 2024);
    assert_eq!(json["month"]["month"], 2);

    Ok(())
}
