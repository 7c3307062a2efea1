pub mod counter_reconciler;
