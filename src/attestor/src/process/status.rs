//! Parsing of the `/proc/<pid>/status` pseudo-file: newline separated `key: value` rows.

/// Value of the first row whose lowercased, trimmed key equals `key`. Rows without a
/// `:` separator are skipped.
pub fn find_value<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content
        .lines()
        .filter_map(|row| row.split_once(':'))
        .find(|(row_key, _)| row_key.trim().to_lowercase() == key)
        .map(|(_, value)| value.trim())
}

/// Supplementary group ids from the `Groups:` row, in kernel order. A missing row means
/// the process has no supplementary groups.
pub fn supplementary_groups(content: &str, key: &str) -> Vec<String> {
    find_value(content, key)
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Numeric ids from a `Uid:`/`Gid:` row (real, effective, saved, filesystem). `None` if
/// the row is missing or any column is not a number.
pub fn numeric_ids(content: &str, key: &str) -> Option<Vec<u32>> {
    let ids = find_value(content, key)?
        .split_whitespace()
        .map(str::parse::<u32>)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{STATUS_GID_KEY, STATUS_GROUPS_KEY, STATUS_UID_KEY};
    use rstest::rstest;

    const STATUS: &str = "Name:\tbash\n\
        Umask:\t0022\n\
        State:\tS (sleeping)\n\
        Pid:\t4242\n\
        Uid:\t1000\t1001\t1002\t1003\n\
        Gid:\t2000\t2000\t2000\t2000\n\
        FDSize:\t256\n\
        Groups:\t4 24 27 100 \n\
        NStgid:\t4242\n";

    #[test]
    fn test_groups_in_kernel_order() {
        assert_eq!(
            supplementary_groups(STATUS, STATUS_GROUPS_KEY),
            vec!["4", "24", "27", "100"]
        );
    }

    #[test]
    fn test_missing_groups_row_is_empty() {
        let status = "Name:\tbash\nUid:\t0\t0\t0\t0\n";
        assert!(supplementary_groups(status, STATUS_GROUPS_KEY).is_empty());
    }

    #[test]
    fn test_empty_groups_row_is_empty() {
        let status = "Name:\tinit\nGroups:\t\n";
        assert!(supplementary_groups(status, STATUS_GROUPS_KEY).is_empty());
    }

    #[rstest]
    #[case("groups: 10 11\n")]
    #[case("GROUPS:10 11\n")]
    #[case("  Groups  :\t10\t11  \n")]
    #[case("garbage line without separator\nGroups:\t10 11\n")]
    fn test_groups_key_is_normalized(#[case] status: &str) {
        assert_eq!(supplementary_groups(status, STATUS_GROUPS_KEY), vec!["10", "11"]);
    }

    #[test]
    fn test_uid_and_gid_columns() {
        assert_eq!(
            numeric_ids(STATUS, STATUS_UID_KEY),
            Some(vec![1000, 1001, 1002, 1003])
        );
        assert_eq!(
            numeric_ids(STATUS, STATUS_GID_KEY),
            Some(vec![2000, 2000, 2000, 2000])
        );
    }

    #[test]
    fn test_malformed_uid_row_is_rejected() {
        assert_eq!(numeric_ids("Uid:\t1000\tabc\n", STATUS_UID_KEY), None);
        assert_eq!(numeric_ids("Uid:\t\n", STATUS_UID_KEY), None);
        assert_eq!(numeric_ids("Name:\tbash\n", STATUS_UID_KEY), None);
    }
}
