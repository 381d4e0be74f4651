// Telemetry is a submodule of query
pub mod telemetry;

// Submodules for separation of concerns
mod eval;
mod exec;
mod parse;
mod shape;
mod translate;
mod types;

// Public API re-exports
pub use eval::{
    CompiledFilter, build_regex, compare_bson, eval_filter, field_equals, field_in,
    field_not_equals, values_equal,
};
pub use exec::{QueryPlan, count, explain, find, find_fallback, find_json, find_one};
pub use parse::{
    DEFAULT_REGEX_OPTIONS, FindOptionsSerde, parse_filter, parse_filter_json,
    parse_find_options_json, parse_sort, parse_sort_json,
};
pub use shape::{compare_records, shape, shape_with};
pub use translate::{Constraint, NativeQuery, escape_pattern, translate};
pub use types::{
    DEFAULT_SORT_FIELD, Filter, FindOptions, OrBranch, Order, Predicate, SortSpec, is_null,
    is_null_equivalent, options_case_insensitive,
};
