use std::cmp::Ordering;

use super::MetricKey;
use crate::audit::Site;

fn current_value(site: &Site, column: MetricKey) -> Option<f64> {
    let result = site.latest_audit()?.audit_result.as_ref()?;
    column.value(result).filter(|v| v.is_finite())
}

/// Order sites by the current value of one column.
///
/// Sites without a value sort last in either direction; equal values keep
/// their input order.
pub fn sort_by_column(sites: &[Site], column: MetricKey, ascending: bool) -> Vec<Site> {
    let mut sorted = sites.to_vec();
    sorted.sort_by(|a, b| {
        match (current_value(a, column), current_value(b, column)) {
            (Some(a), Some(b)) => {
                if ascending {
                    a.total_cmp(&b)
                } else {
                    b.total_cmp(&a)
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    sorted
}
