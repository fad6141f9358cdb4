// handlers/public/mod.rs - handlers reachable without a session
//
// Sign-in flow (/login, /auth/*), liveness, and the microsite-facing API
// (published provider profiles, lead capture).

pub mod auth;
pub mod dentists;
pub mod health;
pub mod leads;
pub mod login;
