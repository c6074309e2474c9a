pub mod shared {
    pub mod core {
        pub mod correlation_id;
        pub mod envelope;
        pub mod errors;
        pub mod transaction;
    }
    pub mod application {
        pub mod mediator;
        pub mod use_case;
        pub mod validation;
    }
    pub mod infrastructure {
        pub mod database;
        pub mod resilience;
    }
    pub mod inbound {
        pub mod request_context;
        pub mod responses;
    }
}

pub mod modules {
    pub mod sample_tasks {
        pub mod core {
            pub mod repository;
            pub mod sample_task;
            pub mod value_objects;
            pub mod views;
        }
        pub mod use_cases {
            pub mod add_sample_task {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
                pub mod transaction;
                pub mod validator;
            }
            pub mod get_sample_task {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
                pub mod transaction;
            }
            pub mod list_sample_tasks {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
                pub mod transaction;
            }
            pub mod update_sample_task_timer {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
                pub mod transaction;
                pub mod validator;
            }
        }
        pub mod adapters {
            pub mod outbound {
                pub mod document_repository;
                pub mod sql_repository;
            }
        }
    }
}

pub mod shell;

#[cfg(test)]
pub mod tests {
    pub mod fixtures;

    pub mod e2e {
        pub mod sample_task_lifecycle_tests;
    }
}
