mod controls;
mod details;
mod matrix;
mod panels;
