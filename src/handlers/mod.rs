// Two tiers: public (no token) and protected (bearer JWT). Admin-only
// operations are checked per handler against the caller's role.

pub mod protected;
pub mod public;
