pub mod slack;
pub mod whatsapp;
