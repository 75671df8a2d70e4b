use aliyun_cloud::{DatapointBatch, Inventory};
use aliyun_metrics::ConstSample;

use crate::{
    catalog::CatalogEntry,
    datapoint::DataPoint,
    domain::DomainSpec,
    error::TranslateError,
};

/// Lazily turns a raw batch into samples for `entry`, one item per raw
/// datapoint, in batch order. Points that cannot be translated come out as
/// errors so the caller decides whether to skip them.
pub fn translate<'a>(
    batch: DatapointBatch,
    entry: &'a CatalogEntry,
    domain: &'a DomainSpec,
    inventory: &'a Inventory,
) -> impl Iterator<Item = Result<ConstSample, TranslateError>> + 'a {
    batch.points.into_iter().map(move |raw| {
        let point = DataPoint::from_value(raw)?;
        let labels = (domain.join_labels)(&point, inventory);
        Ok(ConstSample::new(&entry.descriptor, labels, point.value)?)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        catalog::{MetricCatalog, PRODUCT_PREFIX},
        domains::{eip::EIP, slb::SLB},
        error::MalformedDatapoint,
    };

    #[test]
    fn unknown_resource_gets_empty_derived_label() {
        let catalog = MetricCatalog::build(PRODUCT_PREFIX, &SLB).unwrap();
        let inventory: Inventory = [("lb-1", "prod-lb")].into_iter().collect();
        let batch = DatapointBatch {
            points: vec![json!({ "userId": "1234", "instanceId": "lb-2", "port": "80", "Average": 5.0 })],
        };

        let samples: Vec<_> = translate(batch, &catalog.entries()[0], &SLB, &inventory)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(), 5.0);
        assert_eq!(samples[0].label("instance_name"), Some(""));
        assert_eq!(samples[0].label("vip"), Some(""));
    }

    #[test]
    fn malformed_points_do_not_hide_good_ones() {
        let catalog = MetricCatalog::build(PRODUCT_PREFIX, &EIP).unwrap();
        let inventory: Inventory = [("eip-1", "47.0.0.1")].into_iter().collect();
        let batch = DatapointBatch {
            points: vec![
                json!({ "userId": "1234", "instanceId": "eip-1", "Value": 10 }),
                json!({ "userId": "1234", "Value": 11 }),
                json!({ "userId": "1234", "instanceId": "eip-3", "Average": 12.0 }),
            ],
        };

        let results: Vec<_> = translate(batch, &catalog.entries()[0], &EIP, &inventory).collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().label("ip"), Some("47.0.0.1"));
        assert!(matches!(
            results[1],
            Err(TranslateError::Malformed(MalformedDatapoint::MissingField("instanceId")))
        ));
        let third = results[2].as_ref().unwrap();
        assert_eq!(third.label_values(), ["1234", "eip-3", ""]);
    }

    #[test]
    fn join_with_wrong_arity_is_rejected() {
        fn short_join(point: &DataPoint, _: &Inventory) -> Vec<String> {
            vec![point.owner_id.clone()]
        }
        let broken = DomainSpec {
            join_labels: short_join,
            ..SLB
        };
        let catalog = MetricCatalog::build(PRODUCT_PREFIX, &broken).unwrap();
        let batch = DatapointBatch {
            points: vec![json!({ "userId": "1", "instanceId": "lb-1", "Average": 1.0 })],
        };

        let inventory = Inventory::empty();
        let mut results = translate(batch, &catalog.entries()[0], &broken, &inventory);
        assert!(matches!(results.next(), Some(Err(TranslateError::Sample(_)))));
        assert!(results.next().is_none());
    }
}
