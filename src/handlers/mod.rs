// handlers/mod.rs - two security tiers
//
// Public (no session required) → Protected (user resolved from session cookies)
//
// The API namespace is public to the session gate; protected API handlers take a
// `CurrentUser` extractor and answer 401 JSON themselves instead of redirecting.
pub mod public;
pub mod protected;
