use crate::errors::{AttestError, LookupKind, Result};
use mockall::automock;
use nix::unistd::{Gid, Group, Uid, User};
use tracing::warn;

/// Maps numeric ids to names through the OS identity database.
///
/// `Ok(None)` means the id has no entry, which is not an error: the caller omits the
/// name selector. `Err` means the database could not answer and the run must fail.
#[automock]
pub trait IdentityResolver: Send + Sync {
    fn resolve_user_name(&self, uid: u32) -> Result<Option<String>>;
    fn resolve_group_name(&self, gid: u32) -> Result<Option<String>>;
}

/// `getpwuid_r`/`getgrgid_r` via `nix`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemIdentityResolver;

impl IdentityResolver for SystemIdentityResolver {
    fn resolve_user_name(&self, uid: u32) -> Result<Option<String>> {
        User::from_uid(Uid::from_raw(uid))
            .map(|user| user.map(|user| user.name))
            .map_err(|errno| AttestError::LookupFailed {
                kind: LookupKind::User,
                id: uid.to_string(),
                reason: errno.desc().to_string(),
            })
    }

    fn resolve_group_name(&self, gid: u32) -> Result<Option<String>> {
        Group::from_gid(Gid::from_raw(gid))
            .map(|group| group.map(|group| group.name))
            .map_err(|errno| AttestError::LookupFailed {
                kind: LookupKind::Group,
                id: gid.to_string(),
                reason: errno.desc().to_string(),
            })
    }
}

/// Resolves one id, logging and swallowing the not-found case. Empty names count as
/// not found so they never reach a selector.
pub fn lookup_name(
    resolver: &dyn IdentityResolver,
    kind: LookupKind,
    id: u32,
) -> Result<Option<String>> {
    let name = match kind {
        LookupKind::User => resolver.resolve_user_name(id)?,
        LookupKind::Group => resolver.resolve_group_name(id)?,
    }
    .filter(|name| !name.is_empty());

    if name.is_none() {
        let not_found = AttestError::LookupNotFound {
            kind,
            id: id.to_string(),
        };
        warn!("{not_found}; omitting {kind} name selector");
    }
    Ok(name)
}

/// Supplementary group ids arrive as strings; one that is not numeric cannot be looked up
/// and is treated as not found.
pub fn lookup_group_name_str(resolver: &dyn IdentityResolver, gid: &str) -> Result<Option<String>> {
    match gid.parse::<u32>() {
        Ok(gid) => lookup_name(resolver, LookupKind::Group, gid),
        Err(_) => {
            warn!(gid, "supplementary group id is not numeric; omitting group name selector");
            Ok(None)
        }
    }
}
