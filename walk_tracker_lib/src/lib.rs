pub mod comms;
pub mod geodesy;
pub mod location_fix;
pub mod remote;
pub mod route_summary;
pub mod walk_session;
