//! End-to-end checks against the sample reference data in `data/`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tierline_quote::RuleRow;
use tierline_shared::{FreightMode, PriceSource, PricingRequest};
use tierline_store::{compile_rules_file, load_rules, Config, Engine, EngineHandle, StoreError};

const F7: &str = "2070003002202";
const YOUTH_Z2: &str = "193092002202";

fn data_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../data")
}

fn engine() -> Engine {
    Engine::load(&Config::from_data_root(data_root())).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn usd(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

#[test]
fn test_tier_waterfall() {
    let engine = engine();

    assert_eq!(engine.tier("1730").tier, "PLATINUM");
    assert_eq!(engine.tier("11730").tier, "GOLD");
    assert_eq!(engine.tier("4883").tier, "BRONZE");

    let unknown = engine.tier("NONEXISTENT_ACCOUNT_12345");
    assert_eq!(unknown.tier, "MSRP");
    assert_eq!(unknown.trace.last().unwrap().step, "Fallback");
}

#[test]
fn test_bsn_override_date_gating() {
    let engine = engine();

    let before = engine.price(&PricingRequest::new("11730").with_item(F7, 1).on(date(2026, 1, 30)));
    assert_eq!(before.lines[0].unit_price, usd(26700));
    assert_eq!(before.lines[0].rules_applied, vec!["BSN-F7-VAR".to_string()]);

    let after = engine.price(&PricingRequest::new("11730").with_item(F7, 1).on(date(2026, 2, 2)));
    assert_eq!(after.lines[0].unit_price, usd(39900));
    assert_eq!(after.lines[0].source, PriceSource::Contract);
    assert!(after.lines[0].rules_applied.is_empty());
}

#[test]
fn test_rebate_date_gating() {
    let engine = engine();

    let active = engine.price(&PricingRequest::new("4883").with_item(YOUTH_Z2, 1).on(date(2026, 4, 14)));
    let expired = engine.price(&PricingRequest::new("4883").with_item(YOUTH_Z2, 1).on(date(2026, 4, 16)));

    assert_eq!(expired.lines[0].unit_price - active.lines[0].unit_price, usd(1000));
    assert!(active.lines[0].rules_applied.contains(&"P2-YTH-Z2-10".to_string()));
    assert!(!expired.lines[0].rules_applied.contains(&"P2-YTH-Z2-10".to_string()));
}

#[test]
fn test_volume_discount_and_msrp_fallback() {
    let engine = engine();
    let request = PricingRequest::new("11730")
        .with_item(F7, 12)
        .with_item(YOUTH_Z2, 2)
        .with_item("NOT-A-SKU", 1)
        .on(date(2026, 3, 1));

    let result = engine.price(&request);
    assert_eq!(result.lines.len(), 2);

    // GOLD 399.00 less 5%
    assert_eq!(result.lines[0].unit_price, usd(37905));
    assert_eq!(result.lines[0].extended_price, usd(454860));

    // No GOLD price for the youth helmet
    assert_eq!(result.lines[1].source, PriceSource::Msrp);
    assert_eq!(result.lines[1].tier_used, "MSRP");
    assert_eq!(result.total, usd(454860 + 45800));
    assert_eq!(result.warnings, vec![format!("MSRP fallback used for SKU {}", YOUTH_Z2)]);
}

#[test]
fn test_floor_above_price_is_traced_not_applied() {
    let result = engine().price(&PricingRequest::new("1730").with_item(F7, 1).on(date(2026, 3, 1)));
    let line = &result.lines[0];

    assert_eq!(line.unit_price, usd(37900));
    assert_eq!(line.rules_applied, vec!["PLAT-F7-FLOOR".to_string()]);
    assert!(line.trace_text().contains("price floor $350.00 not applied"));
}

#[test]
fn test_bsn_policy() {
    let engine = engine();

    let march = engine.price(&PricingRequest::new("11730").with_item(F7, 1).on(date(2026, 3, 1)));
    assert_eq!(march.policy.program_id, "BSN");
    assert_eq!(march.policy.terms.code, "NET_60");
    assert_eq!(march.policy.freight.mode, FreightMode::Ffa);

    let january = engine.price(&PricingRequest::new("11730").with_item(F7, 1).on(date(2026, 1, 15)));
    assert_eq!(january.policy.terms.code, "DATED");
    assert_eq!(january.policy.terms.due_date.as_deref(), Some("2026-10-01"));
    assert_eq!(january.policy.terms.net_days, None);

    let by_card = engine.price(
        &PricingRequest::new("11730")
            .with_item(F7, 1)
            .with_payment_method("CC")
            .on(date(2026, 1, 15)),
    );
    assert_eq!(by_card.policy.terms.code, "NET_IMMEDIATE");
    assert_eq!(by_card.policy.terms.net_days, Some(0));
}

#[test]
fn test_sports_line_surcharge() {
    let engine = engine();
    let base = PricingRequest::new("4883").with_item(F7, 1).on(date(2026, 3, 1));

    let ground = engine.price(&base.clone().with_ship_method("UPS GROUND"));
    assert_eq!(ground.policy.program_id, "SPORTS_LINE");
    assert_eq!(ground.policy.adjustments.len(), 1);
    assert_eq!(ground.policy.adjustments[0].code, "SFT_CHG");
    // 18% of BRONZE 449.00
    assert_eq!(ground.policy.adjustments[0].amount, usd(8082));
    assert_eq!(ground.policy.freight.mode, FreightMode::SftPercent);
    assert!(!ground.policy.freight.bill_freight);
    assert_eq!(ground.policy.holds[0].code, "HOLD_SPORTS_LINE_REVIEW");

    let overnight = engine.price(&base.with_ship_method("PRIORITY OVERNIGHT"));
    assert!(overnight.policy.adjustments.is_empty());
    assert!(overnight.policy.freight.bill_freight);
    assert_eq!(overnight.policy.freight.mode, FreightMode::CustomerPaysCarrierRate);
}

#[test]
fn test_standard_policy_by_total_and_tier() {
    let engine = engine();

    let small = engine.price(&PricingRequest::new("99999").with_item(F7, 1).on(date(2026, 3, 1)));
    assert_eq!(small.policy.program_id, "STANDARD");
    assert_eq!(small.policy.terms.code, "NET_30");
    assert_eq!(small.policy.freight.mode, FreightMode::CustomerPaysCarrierRate);

    let large = engine.price(&PricingRequest::new("99999").with_item(F7, 6).on(date(2026, 3, 1)));
    assert_eq!(large.policy.terms.code, "NET_60");
    assert_eq!(large.policy.freight.mode, FreightMode::Ffa);
    assert_eq!(large.policy.freight.ffa_threshold, Some(Decimal::from(2500)));

    let mid = PricingRequest::new("99999").with_item(F7, 4).on(date(2026, 6, 1));
    assert_eq!(engine.price(&mid).policy.freight.mode, FreightMode::CustomerPaysCarrierRate);

    let platinum = engine.price(&mid.with_customer_tier("PLATINUM"));
    assert_eq!(platinum.policy.freight.mode, FreightMode::Ffa);
    assert_eq!(platinum.policy.freight.ffa_threshold, Some(Decimal::from(1750)));
}

#[test]
fn test_trade_in_override() {
    let engine = engine();
    for order_type in [25, 26] {
        let result = engine.price(
            &PricingRequest::new("11730")
                .with_item(F7, 1)
                .with_order_type(order_type)
                .on(date(2026, 3, 1)),
        );
        assert_eq!(result.policy.program_id, "TRADE_IN");
        assert!(result.policy.constraints.no_rebate_stacking);
        assert!(result.policy.constraints.no_discount_stacking);
        assert!(result.policy.terms.needs_review);
    }
}

#[test]
fn test_international_hold() {
    let engine = engine();
    let request = PricingRequest::new("20001").with_item("4500200", 10).on(date(2026, 3, 1));

    let direct = engine.price(&request.clone().with_ship_to_type("DIRECT"));
    assert_eq!(direct.policy.program_id, "INTERNATIONAL");
    assert_eq!(direct.policy.terms.code, "CIA");
    assert_eq!(direct.policy.holds[0].code, "HOLD_INTL_FORWARDER_REQUIRED");
    assert!(direct.policy.holds[0].mandatory);

    let forwarded = engine.price(&request.with_ship_to_type("FORWARDER"));
    assert!(forwarded.policy.holds.is_empty());
}

#[test]
fn test_intel_and_duplicate_catalog_rows() {
    let engine = engine();
    assert_eq!(engine.intel("11730").terms, "NET 60 (DATED in January)");
    assert_eq!(engine.intel("4883").match_value, "4883");
    assert_eq!(engine.intel("99999").match_value, "MSRP");

    let mouthguard = engine.pricing().catalog().get("4500300").unwrap();
    assert_eq!(mouthguard.description, "Mouthguard Strapped");
}

#[test]
fn test_price_is_idempotent() {
    let engine = engine();
    let request = PricingRequest::new("11730")
        .with_item(F7, 14)
        .with_item(YOUTH_Z2, 3)
        .with_item("4500100", 2)
        .on(date(2026, 1, 20));

    let first = engine.price(&request);
    let second = engine.price(&request);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_compiled_artifact_matches_source() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("compiled_rules.json");

    let compiled = compile_rules_file(&data_root().join("rules.csv"), &output).unwrap();
    let shipped = load_rules(&data_root().join("compiled_rules.json")).unwrap();

    assert_eq!(compiled.total_rules, 5);
    assert_eq!(compiled.active_rules, 4);
    assert_eq!(compiled.rules, shipped.rules);
    assert!(shipped.skipped.is_empty());
}

#[test]
fn test_validate_candidate_rule() {
    let engine = engine();
    let candidate = RuleRow {
        rule_id: Some("BSN-F7-SPRING".into()),
        name: Some("BSN spring helmets".into()),
        priority: Some("25".into()),
        account_group: Some("BSN".into()),
        sku_prefix: Some("2070003".into()),
        action_type: Some("discount_percent".into()),
        action_value: Some("3".into()),
        ..Default::default()
    };

    let result = engine.validate_rule(&candidate, date(2026, 3, 1));
    assert!(result.valid);
    assert_eq!(result.matching_products, 3);
    assert_eq!(
        result.warnings,
        vec!["Potential conflict with rule 'BSN-F7-VOLUME' (priority 30 vs 25)".to_string()]
    );

    let duplicate = RuleRow {
        rule_id: Some("BSN-F7-VAR".into()),
        ..candidate
    };
    assert!(!engine.validate_rule(&duplicate, date(2026, 3, 1)).valid);
}

#[test]
fn test_reload_swaps_and_failed_reload_keeps_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    copy_dir(&data_root(), dir.path());

    let handle = EngineHandle::load(Config::from_data_root(dir.path())).unwrap();
    let first = handle.snapshot();
    assert_eq!(first.rules().len(), 5);

    fs::remove_file(dir.path().join("compiled_rules.json")).unwrap();
    let second = handle.reload().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(second.rules().is_empty());
    // Readers holding the old snapshot keep a consistent view
    assert_eq!(first.rules().len(), 5);

    fs::remove_file(dir.path().join("catalog.csv")).unwrap();
    assert!(matches!(handle.reload(), Err(StoreError::MissingSource(_))));
    assert!(Arc::ptr_eq(&second, &handle.snapshot()));
}
