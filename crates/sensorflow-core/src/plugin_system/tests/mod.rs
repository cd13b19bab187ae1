pub mod traits_tests;
