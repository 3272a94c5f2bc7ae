mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metvan_gen::model::GenStage;
use metvan_gen::{GenError, GenPipeline, generate_world};

use common::config;

#[test]
fn stepping_to_the_end_matches_direct_generation() {
    let mut pipeline = GenPipeline::new(config(42, 5)).unwrap();
    let mut steps = 0;
    while pipeline.step().unwrap().is_some() {
        steps += 1;
    }
    assert_eq!(steps, GenStage::ALL.len());
    assert_eq!(pipeline.into_graph().unwrap(), generate_world(config(42, 5)).unwrap());
}

#[test]
fn cancelling_before_the_first_step() {
    let mut pipeline = GenPipeline::new(config(42, 5)).unwrap();
    pipeline.cancel();
    assert_eq!(
        pipeline.step().unwrap_err(),
        GenError::Cancelled(GenStage::DistrictLayout)
    );
    assert!(pipeline.graph().completed.is_empty());
}

#[test]
fn cancel_token_works_across_threads() {
    let mut pipeline = GenPipeline::new(config(13, 8)).unwrap();
    let token = pipeline.cancel_token();
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    pipeline.on_stage_complete(move |_| {
        if seen.fetch_add(1, Ordering::SeqCst) == 2 {
            let token = token.clone();
            std::thread::spawn(move || token.cancel()).join().unwrap();
        }
    });
    let err = pipeline.run_to_completion().unwrap_err();
    assert_eq!(err, GenError::Cancelled(GenStage::DistrictWfc));
    assert_eq!(count.load(Ordering::SeqCst), 3);
}
