pub mod include;
pub mod normalize;
pub mod query_string;
pub mod validate;

pub use include::{compile_include, IncludeNode, IncludeSpec};
pub use normalize::{build_query_options, FieldPredicate, QueryOptions, SortDirection, SortKey};
pub use query_string::{parse_query, scalar_param, QueryMap, QueryValue};
pub use validate::{
    validate_body, validate_id, validate_query_params, BodySchema, FieldKind, FieldRule, Issue,
    ParamFormat, QuerySchema, Rejection, LENIENT_QUERY, STRICT_QUERY,
};
