mod helpers;

mod auth;
mod messages;
mod player;
mod prizes;
mod vouchers;
