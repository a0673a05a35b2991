pub mod alerts;
pub mod auth;
pub mod buildings;
pub mod contracts;
pub mod customers;
pub mod dashboard;
pub mod elevators;
pub mod invoices;
pub mod maintenance;
pub mod notifications;
pub mod parts;
pub mod pricing;
pub mod quotations;
pub mod technician_requests;
pub mod technicians;
pub mod tickets;
