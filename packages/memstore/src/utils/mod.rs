pub mod realip;
