//! Structured audit logging for security-relevant events.
//!
//! Admin mutations, qualification runs, and authentication events are logged
//! under the `audit` target so they can be routed separately.

/// Log an authentication event
pub fn log_auth_event(username: &str, event: &str, success: bool) {
    if success {
        tracing::info!(
            target: "audit",
            event = "auth",
            username = username,
            auth_event = event,
            success = success,
            "Auth: {} - {} (success={})",
            event,
            username,
            success
        );
    } else {
        tracing::warn!(
            target: "audit",
            event = "auth",
            username = username,
            auth_event = event,
            success = success,
            "Auth: {} - {} (success={})",
            event,
            username,
            success
        );
    }
}

/// Log a create, update or delete performed by an admin
pub fn log_admin_action(admin: &str, action: &str, entity: &str, entity_id: &str) {
    tracing::info!(
        target: "audit",
        event = "admin_action",
        admin = admin,
        action = action,
        entity = entity,
        entity_id = entity_id,
        "Admin action: {} {} {} by {}",
        action,
        entity,
        entity_id,
        admin
    );
}

/// Log a bulk qualify run
pub fn log_qualification_event(admin: &str, game_id: &str, qualified: usize, ignored: usize) {
    tracing::info!(
        target: "audit",
        event = "qualification",
        admin = admin,
        game_id = game_id,
        qualified = qualified,
        ignored = ignored,
        "Qualifiers set for game {}: {} qualified, {} ignored by {}",
        game_id,
        qualified,
        ignored,
        admin
    );
}

/// Log a rank-by-time run
pub fn log_ranking_event(admin: &str, game_id: &str, ranked: usize) {
    tracing::info!(
        target: "audit",
        event = "ranking",
        admin = admin,
        game_id = game_id,
        ranked = ranked,
        "Game {} ranked by time: {} positions by {}",
        game_id,
        ranked,
        admin
    );
}

/// Log a password reset. This is the admin notification for the reset.
pub fn log_password_reset(username: &str, reset_date: &str, reset_time: &str) {
    tracing::warn!(
        target: "audit",
        event = "password_reset",
        username = username,
        reset_date = reset_date,
        reset_time = reset_time,
        "Password reset for {} on {} at {}",
        username,
        reset_date,
        reset_time
    );
}

/// Log a security event (rate limiting, revoked tokens, bad service keys, etc.)
pub fn log_security_event(subject: &str, event: &str, details: &str) {
    tracing::warn!(
        target: "audit",
        event = "security",
        subject = subject,
        security_event = event,
        details = details,
        "Security: {} - {} - {}",
        event,
        subject,
        details
    );
}
