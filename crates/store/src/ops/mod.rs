mod catalog;
mod payouts;
mod users;
mod wallets;
mod workers;
