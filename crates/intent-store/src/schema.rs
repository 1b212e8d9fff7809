pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS intent_results (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  check_id TEXT NOT NULL,
  status TEXT NOT NULL,
  ts TEXT NOT NULL,
  severity TEXT,
  description TEXT,
  evidence_json TEXT,
  suspected_causes_json TEXT,
  error TEXT
);

CREATE INDEX IF NOT EXISTS idx_intent_results_check_ts ON intent_results (check_id, ts DESC);
"#;
