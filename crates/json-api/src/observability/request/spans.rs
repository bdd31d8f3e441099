//! HTTP span helpers.

use uuid::Uuid;

/// Collapse identifiers so metrics and spans group by route, not by record.
pub(super) fn route_label(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let mut normalised = String::from("/");

    for (index, segment) in path.trim_start_matches('/').split('/').enumerate() {
        if index > 0 {
            normalised.push('/');
        }

        if Uuid::parse_str(segment).is_ok() {
            normalised.push_str("{id}");
        } else {
            normalised.push_str(segment);
        }
    }

    normalised
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_collapsed() {
        let path = format!("/notifications/{}/read", Uuid::now_v7());

        assert_eq!(route_label(&path), "/notifications/{id}/read");
        assert_eq!(route_label("/payments/verify"), "/payments/verify");
        assert_eq!(route_label("/"), "/");
    }
}
