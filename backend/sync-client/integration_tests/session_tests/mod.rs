mod helpers;
mod session;
mod teardown;
