use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    Uid,
    User,
    Gid,
    Group,
    SupplementaryGid,
    SupplementaryGroup,
    Path,
    Sha256,
}

impl SelectorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::Uid => "uid",
            SelectorKind::User => "user",
            SelectorKind::Gid => "gid",
            SelectorKind::Group => "group",
            SelectorKind::SupplementaryGid => "supplementary_gid",
            SelectorKind::SupplementaryGroup => "supplementary_group",
            SelectorKind::Path => "path",
            SelectorKind::Sha256 => "sha256",
        }
    }
}

impl Display for SelectorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectorValue {
    pub kind: SelectorKind,
    pub value: String,
}

impl SelectorValue {
    pub fn new(kind: SelectorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Rendered as `kind:value`, the form policy entries are written in.
impl Display for SelectorValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplementaryGroup {
    pub gid: String,
    pub name: Option<String>,
}

/// Everything the selector list is derived from, after name resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributedIdentity {
    pub uid: u32,
    pub user: Option<String>,
    pub gid: u32,
    pub group: Option<String>,
    pub supplementary_groups: Vec<SupplementaryGroup>,
    pub path: Option<String>,
    pub sha256: Option<String>,
}

/// Appends selectors in the fixed order
/// `uid, user, gid, group, (supplementary_gid, supplementary_group)*, path, sha256`.
#[derive(Debug, Default)]
pub struct SelectorBuilder {
    selectors: Vec<SelectorValue>,
}

impl SelectorBuilder {
    pub fn build(identity: &AttributedIdentity) -> Vec<SelectorValue> {
        let mut builder = Self {
            selectors: Vec::with_capacity(6 + 2 * identity.supplementary_groups.len()),
        };

        builder.push(SelectorKind::Uid, identity.uid.to_string());
        builder.push_optional(SelectorKind::User, identity.user.as_deref());
        builder.push(SelectorKind::Gid, identity.gid.to_string());
        builder.push_optional(SelectorKind::Group, identity.group.as_deref());

        for group in &identity.supplementary_groups {
            builder.push(SelectorKind::SupplementaryGid, group.gid.clone());
            builder.push_optional(SelectorKind::SupplementaryGroup, group.name.as_deref());
        }

        // a digest without the path it was taken from is never emitted
        if let Some(path) = identity.path.as_deref().filter(|path| !path.is_empty()) {
            builder.push(SelectorKind::Path, path);
            builder.push_optional(SelectorKind::Sha256, identity.sha256.as_deref());
        }

        builder.selectors
    }

    fn push(&mut self, kind: SelectorKind, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.selectors.push(SelectorValue::new(kind, value));
        }
    }

    fn push_optional(&mut self, kind: SelectorKind, value: Option<&str>) {
        if let Some(value) = value {
            self.push(kind, value);
        }
    }
}
