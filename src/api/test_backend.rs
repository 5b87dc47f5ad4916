//! Implements the `Backend` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the production build so that the whole app can be run,
//! top-to-bottom, without a portal. Set `PORTAL_DASH_IN_TEST_MODE` to use it.

use crate::api::{Backend, RawResponse};
use crate::error::LoadError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const TRANSACTIONS_PATH: &str = "/api/bankenspiegel/transaktionen";
const ACCOUNTS_PATH: &str = "/api/bankenspiegel/konten";
const PENDING_PATH: &str = "/api/vacation/approvals/pending";
const SALES_PATH: &str = "/api/verkauf/auftragseingang/detail";
const SALES_SUMMARY_PATH: &str = "/api/verkauf/auftragseingang/summary";
const FINANCING_PATH: &str = "/api/bankenspiegel/einkaufsfinanzierung";
const DASHBOARD_PATH: &str = "/api/bankenspiegel/dashboard";
const BATCH_PATH: &str = "/api/vacation/approvals/batch";
const REQUEST_PREFIX: &str = "/api/vacation/request/";

/// How many requests of each kind are remembered. Older ones are dropped first.
const LOG_LIMIT: usize = 256;

/// A `Backend` that answers from seeded data. Clones share state, so a test can keep a handle to
/// script responses and inspect what was requested after handing a clone to a `DataLoader`.
#[derive(Debug, Clone, Default)]
pub struct TestBackend {
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    overrides: HashMap<String, RawResponse>,
    pending: Vec<Value>,
    delay: Option<Duration>,
    requests: Vec<(String, Vec<(String, String)>)>,
    posts: Vec<(String, Value)>,
}

impl Default for State {
    /// Loads the seed data from this module.
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            pending: seed(PENDING_DATA),
            delay: None,
            requests: Vec::new(),
            posts: Vec::new(),
        }
    }
}

impl TestBackend {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answers every request to `path` with `response` instead of the seed data.
    pub fn set_response(&self, path: &str, response: RawResponse) {
        self.lock().overrides.insert(path.to_string(), response);
    }

    /// Makes every request wait `delay` before it is answered.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// The GET requests received so far, as path and query.
    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.lock().requests.clone()
    }

    /// The POST requests received so far, as path and body.
    pub fn posts(&self) -> Vec<(String, Value)> {
        self.lock().posts.clone()
    }

    /// IDs of the vacation requests still pending.
    pub fn pending_ids(&self) -> Vec<u64> {
        self.lock().pending.iter().filter_map(request_id).collect()
    }

    async fn wait(&self) {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl Backend for TestBackend {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, LoadError> {
        self.wait().await;
        let mut state = self.lock();
        log(&mut state.requests, (path.to_string(), query.to_vec()));
        if let Some(response) = state.overrides.get(path) {
            return Ok(response.clone());
        }
        let body = match path {
            TRANSACTIONS_PATH => {
                let rows = window(seed(TRANSACTION_DATA), query);
                json!({ "status": "success", "transaktionen": rows })
            }
            ACCOUNTS_PATH => json!({ "status": "success", "konten": seed(ACCOUNT_DATA) }),
            PENDING_PATH => json!({ "success": true, "data": state.pending }),
            SALES_PATH => json!({ "success": true, "verkaufer": seed(SALES_DATA) }),
            SALES_SUMMARY_PATH => {
                let param = |key: &str| query.iter().find(|(k, _)| k == key).map(|(_, v)| v);
                json!({
                    "success": true,
                    "month": param("month"),
                    "year": param("year"),
                    "summary": seed(SALES_SUMMARY_DATA),
                })
            }
            FINANCING_PATH => {
                let mut body: Value =
                    serde_json::from_str(FINANCING_CONTEXT).unwrap_or_else(|_| json!({}));
                body["success"] = json!(true);
                body["top_fahrzeuge"] = Value::Array(seed(FINANCING_DATA));
                body
            }
            DASHBOARD_PATH => json!({
                "status": "success",
                "dashboard": serde_json::from_str::<Value>(DASHBOARD_DATA).unwrap_or_default(),
            }),
            _ => return Ok(not_found("Endpoint nicht gefunden")),
        };
        Ok(RawResponse::new(200, body.to_string()))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<RawResponse, LoadError> {
        self.wait().await;
        let mut state = self.lock();
        log(&mut state.posts, (path.to_string(), body.clone()));
        if let Some(response) = state.overrides.get(path) {
            return Ok(response.clone());
        }

        if path == BATCH_PATH {
            let ids: Vec<u64> = body
                .get("request_ids")
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
                .unwrap_or_default();
            let action = body.get("action").and_then(Value::as_str).unwrap_or("");
            let key = match action {
                "approve" => "approved",
                "reject" => "rejected",
                _ => return Ok(bad_request("Unbekannte Aktion")),
            };
            let processed = state.remove(&ids);
            let body = json!({ "status": "success", "data": { key: processed } });
            return Ok(RawResponse::new(200, body.to_string()));
        }

        let Some((id, action)) = path
            .strip_prefix(REQUEST_PREFIX)
            .and_then(|rest| rest.split_once('/'))
        else {
            return Ok(not_found("Endpoint nicht gefunden"));
        };
        if action != "approve" && action != "reject" {
            return Ok(not_found("Endpoint nicht gefunden"));
        }
        match id.parse::<u64>() {
            Ok(id) if state.remove(&[id]) == 1 => {
                let body = json!({ "success": true, "request_id": id, "action": action });
                Ok(RawResponse::new(200, body.to_string()))
            }
            _ => Ok(not_found("Antrag nicht gefunden")),
        }
    }
}

impl State {
    /// Removes the given pending requests and returns how many were found.
    fn remove(&mut self, ids: &[u64]) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|r| request_id(r).map_or(true, |id| !ids.contains(&id)));
        before - self.pending.len()
    }
}

fn log<T>(entries: &mut Vec<T>, entry: T) {
    if entries.len() >= LOG_LIMIT {
        entries.remove(0);
    }
    entries.push(entry);
}

fn request_id(request: &Value) -> Option<u64> {
    request.get("request_id").and_then(Value::as_u64)
}

fn not_found(message: &str) -> RawResponse {
    RawResponse::new(404, json!({ "success": false, "error": message }).to_string())
}

fn bad_request(message: &str) -> RawResponse {
    RawResponse::new(400, json!({ "success": false, "error": message }).to_string())
}

/// Applies the `offset` and `limit` query parameters the way the portal pages its lists.
fn window(rows: Vec<Value>, query: &[(String, String)]) -> Vec<Value> {
    let param = |key: &str| {
        query
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.parse::<usize>().ok())
    };
    let offset = param("offset").unwrap_or(0);
    let limit = param("limit").unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}

/// Parses a seed list. The constants below are known to be valid JSON arrays.
fn seed(data: &str) -> Vec<Value> {
    serde_json::from_str(data).unwrap_or_default()
}

/// Seed bookings, newest first as the portal sends them.
const TRANSACTION_DATA: &str = r#"[
  {"id": 9012, "konto_id": 1, "buchungsdatum": "2025-10-20", "betrag": -1250.00, "verwendungszweck": "Miete Lager Oktober", "bank_name": "Sparkasse", "kontoname": "Geschäftskonto", "iban": "DE89370400440532013000"},
  {"id": 9011, "konto_id": 2, "buchungsdatum": "2025-10-19", "betrag": 38450.00, "verwendungszweck": "Fahrzeugverkauf WVWZZZ1KZ8W123456", "bank_name": "Volksbank", "kontoname": "Verkaufskonto", "iban": "DE02120300000000202051"},
  {"id": 9010, "konto_id": 1, "buchungsdatum": "2025-10-18", "betrag": -87.43, "verwendungszweck": "Tankstelle Aral", "bank_name": "Sparkasse", "kontoname": "Geschäftskonto", "iban": "DE89370400440532013000"},
  {"id": 9009, "konto_id": 1, "buchungsdatum": "2025-10-15", "betrag": "2.500,00", "verwendungszweck": "Werkstattrechnung 4711", "bank_name": "Sparkasse", "kontoname": "Geschäftskonto", "iban": "DE89370400440532013000"},
  {"id": 9008, "konto_id": 2, "buchungsdatum": "2025-10-14", "betrag": -21000.00, "verwendungszweck": "Ablösung Einkaufsfinanzierung", "bank_name": "Volksbank", "kontoname": "Verkaufskonto", "iban": "DE02120300000000202051"},
  {"id": 9007, "konto_id": 1, "buchungsdatum": "2025-10-10", "betrag": -450.10, "verwendungszweck": "Telekom Rechnung", "bank_name": "Sparkasse", "kontoname": "Geschäftskonto", "iban": "DE89370400440532013000"},
  {"id": 9006, "konto_id": 3, "buchungsdatum": "2025-10-08", "betrag": 1200.00, "verwendungszweck": "Umbuchung vom Geschäftskonto", "bank_name": "Sparkasse", "kontoname": "Rücklagen", "iban": "DE89370400440532019999"},
  {"id": 9005, "konto_id": 1, "buchungsdatum": "2025-10-08", "betrag": -1200.00, "verwendungszweck": "Umbuchung auf Rücklagen", "bank_name": "Sparkasse", "kontoname": "Geschäftskonto", "iban": "DE89370400440532013000"},
  {"id": 9004, "konto_id": 2, "buchungsdatum": "2025-10-02", "betrag": 15990.00, "verwendungszweck": "Fahrzeugverkauf TMBJJ7NE1L0123456", "bank_name": "Volksbank", "kontoname": "Verkaufskonto", "iban": "DE02120300000000202051"},
  {"id": 9003, "konto_id": 1, "buchungsdatum": "2025-10-01", "betrag": -18400.00, "verwendungszweck": "Gehälter September", "bank_name": "Sparkasse", "kontoname": "Geschäftskonto", "iban": "DE89370400440532013000"},
  {"id": 9002, "konto_id": 1, "buchungsdatum": "2025-09-30", "betrag": 0, "verwendungszweck": "Kontoabschluss", "bank_name": "Sparkasse", "kontoname": "Geschäftskonto", "iban": "DE89370400440532013000"},
  {"id": 9001, "konto_id": 2, "buchungsdatum": null, "betrag": 99.99, "verwendungszweck": "Gutschrift ohne Datum", "bank_name": "Volksbank", "kontoname": "Verkaufskonto", "iban": "DE02120300000000202051"}
]"#;

const ACCOUNT_DATA: &str = r#"[
  {"id": 1, "bank_name": "Sparkasse", "kontoname": "Geschäftskonto", "iban": "DE89370400440532013000", "saldo": 48210.55, "aktueller_saldo": 47123.12, "aktiv": true},
  {"id": 2, "bank_name": "Volksbank", "kontoname": "Verkaufskonto", "iban": "DE02120300000000202051", "saldo": 132900.00, "aktiv": 1},
  {"id": 3, "bank_name": "Sparkasse", "kontoname": "Rücklagen", "iban": "DE89370400440532019999", "aktueller_saldo": "25.000,00", "aktiv": true},
  {"id": 4, "bank_name": "Volksbank", "kontoname": "Kontokorrent", "iban": "DE02120300000000209999", "saldo": -8450.75, "aktiv": true},
  {"id": 5, "bank_name": "Commerzbank", "kontoname": "Altkonto", "iban": "DE44500105175407324931", "saldo": 12.00, "aktiv": false}
]"#;

const PENDING_DATA: &str = r#"[
  {"request_id": 101, "employee_name": "Anna Schmidt", "department": "Verkauf", "start_date": "2025-11-03", "end_date": "2025-11-07", "working_days": 5, "vacation_type": "Erholungsurlaub", "comment": "Herbstferien"},
  {"request_id": 102, "employee_name": "Jonas Weber", "department": "Werkstatt", "start_date": "2025-12-22", "end_date": "2025-12-31", "working_days": 6, "vacation_type": "Erholungsurlaub", "comment": null},
  {"request_id": 103, "employee_name": "Lea Fischer", "department": "Werkstatt", "start_date": "2025-11-14", "end_date": "2025-11-14", "working_days": 0.5, "vacation_type": "Sonderurlaub", "comment": "Umzug"},
  {"request_id": 104, "employee_name": "Tim Becker", "department": null, "start_date": "Mon, 10 Nov 2025 00:00:00 GMT", "end_date": "Wed, 12 Nov 2025 00:00:00 GMT", "working_days": "3", "vacation_type": "Erholungsurlaub", "comment": ""}
]"#;

const SALES_DATA: &str = r#"[
  {"verkaufer_name": "Max Müller", "summe_neu": 4, "summe_test_vorfuehr": 1, "summe_gebraucht": 3, "summe_gesamt": 8,
   "neu": [{"modell": "Golf", "anzahl": 3}, {"modell": "Tiguan", "anzahl": 1}],
   "test_vorfuehr": [{"modell": "ID.4", "anzahl": 1}],
   "gebraucht": [{"modell": "Passat", "anzahl": 2}, {"modell": "Polo", "anzahl": 1}]},
  {"verkaufer_name": "Sabine Koch", "summe_neu": 2, "summe_test_vorfuehr": 0, "summe_gebraucht": 5, "summe_gesamt": 7,
   "neu": [{"modell": "Octavia", "anzahl": 2}], "test_vorfuehr": [], "gebraucht": [{"modell": "Fabia", "anzahl": 5}]},
  {"verkaufer_name": "Peter Wolf", "summe_neu": 1, "summe_test_vorfuehr": 2, "summe_gebraucht": 0,
   "neu": [{"modell": "T-Roc", "anzahl": 1}], "test_vorfuehr": [{"modell": "Golf", "anzahl": 2}], "gebraucht": null}
]"#;

const FINANCING_DATA: &str = r#"[
  {"vin": "WVWZZZ1KZ8W123456", "institut": "Santander", "modell": "Golf 8 Life", "marke": "VW", "saldo": 24500.00, "original": 28900.00, "alter": 94},
  {"vin": "TMBJJ7NE1L0123456", "institut": "Santander", "modell": "Octavia Combi", "marke": "Skoda", "saldo": 19850.00, "original": 21000.00, "alter": 41},
  {"vin": "WVGZZZ5NZLW123456", "institut": "VW Bank", "modell": "Tiguan", "marke": "VW", "saldo": 31200.00, "original": 36500.00, "alter": 130},
  {"vin": "VSSZZZKJZPR123456", "institut": "VW Bank", "modell": "Ibiza", "marke": "Seat", "saldo": 0, "original": 17500.00, "alter": 12},
  {"vin": "WAUZZZGY3PA123456", "institut": "Stellantis", "modell": "A3 Sportback", "marke": "Audi", "saldo": 27990.00, "original": 27990.00, "alter": 7}
]"#;

const SALES_SUMMARY_DATA: &str = r#"[
  {"make_number": 40, "marke": "Opel", "gesamt": 9, "neu": 5, "test_vorfuehr": 2, "gebraucht": 2,
   "anzahl_verkaufer": 3, "umsatz_gesamt": 248300.00},
  {"make_number": 27, "marke": "Hyundai", "gesamt": 4, "neu": 2, "test_vorfuehr": 1, "gebraucht": 1,
   "anzahl_verkaufer": 2, "umsatz_gesamt": 119750.00},
  {"make_number": 3, "marke": "Skoda", "gesamt": 5, "neu": 0, "test_vorfuehr": 0, "gebraucht": 5,
   "anzahl_verkaufer": 2, "umsatz_gesamt": 61400.00}
]"#;

/// The portfolio figures sent beside the top vehicles.
const FINANCING_CONTEXT: &str = r#"{
  "gesamt": {"anzahl_fahrzeuge": 42, "finanzierung": 1035400.00, "original": 1380000.00, "abbezahlt": 344600.00,
             "abbezahlt_prozent": 24.97},
  "institute": [
    {"name": "Stellantis", "anzahl": 18, "finanzierung": 502300.00, "original": 610000.00, "abbezahlt": 107700.00,
     "durchschnitt": 27905.56, "aeltestes": 211, "marken": [{"name": "Opel", "anzahl": 15}, {"name": "Audi", "anzahl": 3}]},
    {"name": "Santander", "anzahl": 14, "finanzierung": 338900.00, "original": 470000.00, "abbezahlt": 131100.00,
     "durchschnitt": 24207.14, "aeltestes": 164, "marken": [{"name": "VW", "anzahl": 9}, {"name": "Skoda", "anzahl": 5}]},
    {"name": "VW Bank", "anzahl": 10, "finanzierung": 194200.00, "original": 300000.00, "abbezahlt": 105800.00,
     "durchschnitt": 19420.00, "aeltestes": 130, "marken": [{"name": "VW", "anzahl": 7}, {"name": "Seat", "anzahl": 3}]}
  ],
  "warnungen": [
    {"vin": "W0VZZZ8HZN1234567", "institut": "Stellantis", "modell": "Astra L", "tage_uebrig": 6, "kritisch": true,
     "saldo": 25400.00, "alter": 174},
    {"vin": "WVWZZZ1KZ8W123456", "institut": "Santander", "modell": "Golf 8 Life", "tage_uebrig": 24, "kritisch": false,
     "saldo": 24500.00, "alter": 94}
  ]
}"#;

const DASHBOARD_DATA: &str = r#"{
  "gesamtsaldo": 196682.37,
  "anzahl_banken": 2,
  "anzahl_konten": 4,
  "anzahl_konten_gesamt": 5,
  "letzte_30_tage": {"anzahl_transaktionen": 11, "einnahmen": 59340.00, "ausgaben": -42387.53, "saldo": 16952.47},
  "interne_transfers_30_tage": {"anzahl_transaktionen": 2, "volumen": 1200.00}
}"#;
