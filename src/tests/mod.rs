//! Unit test modules for the recommender core.

mod scoring_test;
