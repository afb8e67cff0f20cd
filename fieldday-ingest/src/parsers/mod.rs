pub mod client_csv;
