pub mod formatter;

pub use formatter::{
    change_badge, format_audit_history, format_audited_at, format_change, format_delta_series,
    format_distribution, format_errors, format_leaderboard_table, format_leaderboard_tsv,
    format_organizations, format_percent, format_performance_pairs, format_runtime_error,
    format_scores_table, format_seconds, format_signed, format_site_list, score_badge,
    should_use_colors, tbt_badge, Badge,
};
