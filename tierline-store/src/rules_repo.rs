//! Rule source table and the compiled rule artifact on disk.

use std::fs;
use std::io::Write;
use std::path::Path;
use tierline_quote::{compile_rows, load_compiled, CompiledRules, LoadedRules, RuleRow};

use crate::error::StoreError;

/// Read the editable rule table
pub fn read_rule_rows(path: &Path) -> Result<Vec<RuleRow>, StoreError> {
    if !path.exists() {
        return Err(StoreError::MissingSource(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;

    reader
        .deserialize::<RuleRow>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

/// Compile `input` into the artifact at `output`.
///
/// Nothing is written unless every row is valid. The artifact is written to
/// a sibling temp file and renamed into place, so readers never see a
/// partial file.
pub fn compile_rules_file(input: &Path, output: &Path) -> Result<CompiledRules, StoreError> {
    let rows = read_rule_rows(input)?;
    let rules = compile_rows(&rows)?;
    let compiled = CompiledRules::new(input.display().to_string(), rules);

    let json = serde_json::to_string_pretty(&compiled).map_err(|e| StoreError::json(output, e))?;
    write_atomically(output, json.as_bytes())?;

    tracing::info!(
        total = compiled.total_rules,
        active = compiled.active_rules,
        output = %output.display(),
        "rules compiled"
    );
    Ok(compiled)
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    let mut file = fs::File::create(tmp).map_err(|e| StoreError::io(tmp, e))?;
    file.write_all(contents).map_err(|e| StoreError::io(tmp, e))?;
    file.sync_all().map_err(|e| StoreError::io(tmp, e))?;
    drop(file);

    fs::rename(tmp, path).map_err(|e| StoreError::io(path, e))
}

/// Load the compiled artifact; a missing artifact means no rules
pub fn load_rules(path: &Path) -> Result<LoadedRules, StoreError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no compiled rules, pricing without rules");
        return Ok(LoadedRules::default());
    }
    let json = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let loaded = load_compiled(&json).map_err(|e| StoreError::json(path, e))?;
    tracing::info!(
        rules = loaded.rules.len(),
        skipped = loaded.skipped.len(),
        "compiled rules loaded"
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "rule_id,name,active,priority,account,account_group,sku,sku_prefix,brand,min_qty,max_qty,start_date,end_date,channel,action_type,action_value,notes\n";

    #[test]
    fn test_compile_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rules.csv");
        let output = dir.path().join("out").join("compiled_rules.json");
        fs::write(
            &input,
            format!(
                "{}LATE,Late,true,90,,,*,,,,,,,,discount_amount,5,\nBSN-F7-VAR,BSN F7,true,10,,BSN,2070003002202,,,,,2026-01-01,2026-01-31,,override_unit_price,267,Winter promo\n",
                HEADER
            ),
        )
        .unwrap();

        let compiled = compile_rules_file(&input, &output).unwrap();
        assert_eq!(compiled.total_rules, 2);
        assert_eq!(compiled.rules[0].rule_id, "BSN-F7-VAR");

        let loaded = load_rules(&output).unwrap();
        assert_eq!(loaded.rules, compiled.rules);
        assert!(!output.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_failed_compile_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rules.csv");
        let output = dir.path().join("compiled_rules.json");
        fs::write(
            &input,
            format!("{},No id,true,10,,,*,,,,,,,,discount_amount,5,\nR2,Bad,true,x,,,,,,,,,,,nope,,\n", HEADER),
        )
        .unwrap();

        let err = compile_rules_file(&input, &output).unwrap_err();
        let StoreError::Compile(compile) = err else {
            panic!("expected compile error");
        };
        assert!(compile.errors.len() >= 3);
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_artifact_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_rules(&dir.path().join("compiled_rules.json")).unwrap();
        assert!(loaded.rules.is_empty());
        assert!(matches!(
            read_rule_rows(&dir.path().join("rules.csv")),
            Err(StoreError::MissingSource(_))
        ));
    }
}
