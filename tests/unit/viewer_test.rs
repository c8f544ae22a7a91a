//! Unit tests for the viewer sink

use std::sync::Arc;

use pcdseq::cloud::PointXyz;
use pcdseq::playback::{PlaybackSettings, SequencePlayer};
use pcdseq::viewer::ViewerSettings;
use pcdseq::{Cloud, CloudViewer, PublicationSink, RecordKind, Sequence, ViewerAction};

use crate::helpers::{frame_paths, FakeLoader};

fn cloud(points: usize) -> Arc<Cloud> {
    Arc::new(Cloud::Xyz(vec![PointXyz::default(); points]))
}

#[test]
fn new_record_is_shown_then_updated() {
    let mut viewer = CloudViewer::new(ViewerSettings {
        coordinate_system: false,
        ..Default::default()
    });

    viewer.publish(RecordKind::Xyz, &cloud(1));
    assert!(matches!(
        viewer.refresh().as_slice(),
        [ViewerAction::ShowCloud {
            kind: RecordKind::Xyz,
            ..
        }]
    ));
    assert!(viewer.is_shown(RecordKind::Xyz));

    viewer.publish(RecordKind::Xyz, &cloud(2));
    match viewer.refresh().as_slice() {
        [ViewerAction::UpdateCloud { kind, record }] => {
            assert_eq!(*kind, RecordKind::Xyz);
            assert_eq!(record.len(), 2);
        }
        other => panic!("unexpected actions {:?}", other),
    }
    assert!(viewer.refresh().is_empty());
}

#[test]
fn disabling_a_kind_hides_it() {
    let mut viewer = CloudViewer::default();
    viewer.publish(RecordKind::XyzRgb, &cloud(1));
    viewer.refresh();
    assert!(viewer.coordinate_system_shown());

    viewer.set_display(RecordKind::XyzRgb, false);
    viewer.set_coordinate_system(false);
    assert_eq!(
        viewer.refresh(),
        vec![
            ViewerAction::HideCoordinateSystem,
            ViewerAction::HideCloud {
                kind: RecordKind::XyzRgb
            }
        ]
    );
    assert!(!viewer.is_shown(RecordKind::XyzRgb));
    // The record is kept for when the kind is shown again.
    assert_eq!(viewer.latest(RecordKind::XyzRgb).unwrap().len(), 1);
}

#[test]
fn kinds_are_tracked_independently() {
    let mut viewer = CloudViewer::new(ViewerSettings {
        coordinate_system: false,
        ..Default::default()
    });
    viewer.publish(RecordKind::Xyz, &cloud(1));
    viewer.publish(RecordKind::XyzSift, &cloud(3));
    assert_eq!(viewer.refresh().len(), 2);

    viewer.publish(RecordKind::XyzSift, &cloud(4));
    let actions = viewer.refresh();
    assert_eq!(actions.len(), 1);
    assert!(matches!(
        actions[0],
        ViewerAction::UpdateCloud {
            kind: RecordKind::XyzSift,
            ..
        }
    ));
}

#[test]
fn viewer_counts_end_of_sequence_from_player() {
    let mut player = SequencePlayer::with_sequence(
        PlaybackSettings::default(),
        Sequence::new(frame_paths(2)),
        FakeLoader::new(),
    );
    let mut viewer = CloudViewer::default();
    for _ in 0..5 {
        player.tick(&mut viewer);
    }
    assert_eq!(viewer.ends_seen(), 1);
    assert_eq!(viewer.latest(RecordKind::Xyz).unwrap().len(), 2);
}
