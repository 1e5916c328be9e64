//! Canonical metric names
//!
//! Instruments are declared under CamelCase identifiers
//! (`K8gbGslbErrorsTotal`) and exposed under snake_case names
//! (`k8gb_gslb_errors_total`).

/// Derive the external metric name from an internal identifier.
///
/// Splits immediately before every uppercase character, drops empty
/// fragments, lower-cases each fragment and joins them with `_`.
/// Digits and lowercase letters never start a new fragment, so `K8gb`
/// stays one word.
///
/// ```
/// use gslb_metrics::metrics::canonical_name;
///
/// assert_eq!(canonical_name("K8gbGslbErrorsTotal"), "k8gb_gslb_errors_total");
/// assert_eq!(canonical_name("K8gbGslbStatusCountForGeoip"), "k8gb_gslb_status_count_for_geoip");
/// ```
pub fn canonical_name(ident: &str) -> String {
    let mut fragments: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in ident.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            fragments.push(std::mem::take(&mut current));
        }
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        fragments.push(current);
    }

    fragments.join("_")
}
