//! Addition and multiplication of typed nodes
//!
//! Adding nodes of one family concatenates them into the plural type, left
//! operand first. Multiplying the algorithm family with the dataset family
//! yields [`Experiments`]: the cartesian product, left operand as the outer
//! loop. Experiments can only be added.

use std::ops::{Add, Mul};

use crate::domain::entities::{
    Algorithm, Algorithms, Dataset, Datasets, Experiment, Experiments,
};

/// Operands that can be spread into their individual nodes.
pub trait Members {
    type Item;

    fn members(self) -> Vec<Self::Item>;
}

macro_rules! family {
    ($single:ident, $plural:ident) => {
        impl Members for $single {
            type Item = $single;

            fn members(self) -> Vec<$single> {
                vec![self]
            }
        }

        impl Members for $plural {
            type Item = $single;

            fn members(self) -> Vec<$single> {
                self.into_vec()
            }
        }

        family!(@add $single, $single, $plural);
        family!(@add $single, $plural, $plural);
        family!(@add $plural, $single, $plural);
        family!(@add $plural, $plural, $plural);
    };
    (@add $left:ident, $right:ident, $plural:ident) => {
        impl Add<$right> for $left {
            type Output = $plural;

            fn add(self, rhs: $right) -> $plural {
                let mut items = self.members();
                items.extend(rhs.members());
                $plural::from_parts(items)
            }
        }
    };
}

family!(Algorithm, Algorithms);
family!(Dataset, Datasets);
family!(Experiment, Experiments);

/// `left * right` where the left operand belongs to the algorithm family.
fn algorithms_outer(algorithms: Vec<Algorithm>, datasets: Vec<Dataset>) -> Experiments {
    let mut experiments = Vec::with_capacity(algorithms.len() * datasets.len());
    for algorithm in &algorithms {
        for dataset in &datasets {
            experiments.push(Experiment::from_parts(algorithm.clone(), dataset.clone()));
        }
    }
    Experiments::from_parts(experiments)
}

/// `left * right` where the left operand belongs to the dataset family.
fn datasets_outer(datasets: Vec<Dataset>, algorithms: Vec<Algorithm>) -> Experiments {
    let mut experiments = Vec::with_capacity(algorithms.len() * datasets.len());
    for dataset in &datasets {
        for algorithm in &algorithms {
            experiments.push(Experiment::from_parts(algorithm.clone(), dataset.clone()));
        }
    }
    Experiments::from_parts(experiments)
}

macro_rules! product {
    ($($algorithm:ident * $dataset:ident),+ $(,)?) => {
        $(
            impl Mul<$dataset> for $algorithm {
                type Output = Experiments;

                fn mul(self, rhs: $dataset) -> Experiments {
                    algorithms_outer(self.members(), rhs.members())
                }
            }

            impl Mul<$algorithm> for $dataset {
                type Output = Experiments;

                fn mul(self, rhs: $algorithm) -> Experiments {
                    datasets_outer(self.members(), rhs.members())
                }
            }
        )+
    };
}

product!(
    Algorithm * Dataset,
    Algorithm * Datasets,
    Algorithms * Dataset,
    Algorithms * Datasets
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn algorithm(image: &str) -> Algorithm {
        Algorithm::try_from(json!({"image": image, "instance": "m"})).unwrap()
    }

    fn dataset(name: &str) -> Dataset {
        Dataset::try_from(json!({"path": {name: name}})).unwrap()
    }

    #[test]
    fn addition_keeps_left_operand_first() {
        let sum = algorithm("a") + algorithm("b") + algorithm("c");
        let images: Vec<&str> = sum.iter().map(Algorithm::image).collect();
        assert_eq!(images, vec!["a", "b", "c"]);
    }

    #[test]
    fn dataset_on_the_left_is_the_outer_loop() {
        let experiments = (dataset("1") + dataset("2")) * (algorithm("a") + algorithm("b"));
        let pairs: Vec<(String, String)> = experiments
            .iter()
            .map(|e| {
                let key = e.dataset().path().keys().next().cloned().unwrap_or_default();
                (e.algorithm().image().to_string(), key)
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "1".to_string()),
                ("a".to_string(), "2".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }
}
