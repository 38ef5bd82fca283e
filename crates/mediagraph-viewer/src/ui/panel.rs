use std::time::Instant;

use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};

use mediagraph_core::NodeKind;

use crate::graph::layout::LayoutAlgorithm;
use crate::graph::scan::ScanPhase;
use crate::graph::SessionState;
use crate::net::BackendClient;
use crate::ui::PANEL_W;

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Image => "image",
        NodeKind::Text => "text",
        NodeKind::Concept => "concept",
    }
}

pub fn ui_panel(mut contexts: EguiContexts, mut st: ResMut<SessionState>) {
    egui::SidePanel::left("left")
        .default_width(PANEL_W)
        .show(contexts.ctx_mut(), |ui| {
            ui.heading("MediaGraph");
            ui.label(format!("nodes: {}", st.model.nodes.len()));
            ui.label(format!("edges: {}", st.model.edges.len()));
            ui.separator();

            // Search
            ui.label("Search (name or caption):");
            let resp = ui.text_edit_singleline(&mut st.search.query);
            if resp.changed() {
                let query = st.search.query.clone();
                st.set_query(&query);
            }
            if st.search.is_active() {
                ui.label(format!("{} match(es)", st.search.match_count()));
            }

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Scan");
            ui.label("Folder:");
            ui.text_edit_singleline(&mut st.ui.scan_form.path);

            ui.checkbox(&mut st.ui.scan_form.use_llm, "Deep LLM analysis");
            if st.ui.scan_form.use_llm {
                ui.add(
                    egui::TextEdit::singleline(&mut st.ui.scan_form.api_key)
                        .password(true)
                        .hint_text("API key"),
                );
                ui.horizontal(|ui| {
                    ui.label("Provider:");
                    ui.text_edit_singleline(&mut st.ui.scan_form.provider);
                });
                ui.horizontal(|ui| {
                    ui.label("Base URL:");
                    ui.text_edit_singleline(&mut st.ui.scan_form.base_url);
                });

                if ui.button("Load model list").clicked() {
                    st.request_models();
                }
                let selected = if st.ui.scan_form.model_id.is_empty() {
                    "(default)".to_string()
                } else {
                    st.ui.scan_form.model_id.clone()
                };
                let models = st.ui.scan_form.models.clone();
                egui::ComboBox::from_label("model")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        ui.selectable_value(
                            &mut st.ui.scan_form.model_id,
                            String::new(),
                            "(default)",
                        );
                        for model in models {
                            ui.selectable_value(
                                &mut st.ui.scan_form.model_id,
                                model.id.clone(),
                                format!("{} ({})", model.name, model.id),
                            );
                        }
                    });
            }

            ui.horizontal(|ui| {
                let idle = st.scan.phase == ScanPhase::Idle;
                if ui.add_enabled(idle, egui::Button::new("Start scan")).clicked() {
                    st.request_start(Instant::now());
                }
                let scanning = st.scan.phase == ScanPhase::Scanning;
                if ui.add_enabled(scanning, egui::Button::new("Stop")).clicked() {
                    st.request_stop(Instant::now());
                }
            });

            if st.scan.is_active() {
                let progress = &st.scan.progress;
                ui.label(format!(
                    "Scanning... {} / {}",
                    progress.processed, progress.total
                ));
                if !progress.current.is_empty() {
                    ui.label(egui::RichText::new(&progress.current).small());
                }
                for line in progress.logs.iter().rev().take(4).rev() {
                    ui.label(egui::RichText::new(line).small().weak());
                }
            }

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Graph");
            let mut threshold = st.ui.sim_threshold;
            let resp = ui.add(
                egui::Slider::new(&mut threshold, 0.5..=1.0).text("similarity threshold"),
            );
            if resp.changed() {
                st.submit_threshold(threshold, Instant::now());
            }

            let current = st.layout.algorithm;
            egui::ComboBox::from_label("layout")
                .selected_text(current.label())
                .show_ui(ui, |ui| {
                    for algorithm in LayoutAlgorithm::ALL {
                        ui.selectable_value(
                            &mut st.layout.algorithm,
                            algorithm,
                            algorithm.label(),
                        );
                    }
                });

            ui.horizontal(|ui| {
                if ui.button("Refresh").clicked() {
                    st.request_refresh();
                }
                if ui.button("Reset index").clicked() {
                    st.request_reset();
                }
            });

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Details");
            if let Some(selected) = st.selection.selected.clone() {
                if let Some(node) = st.model.nodes.get(&selected).cloned() {
                    ui.label(egui::RichText::new(&node.name).strong());
                    ui.label(format!("type: {}", kind_label(node.kind)));
                }
                if let Some(detail) = st.selection.detail.clone() {
                    if !detail.caption.is_empty() {
                        ui.label(format!("Caption: {}", detail.caption));
                    }
                    if !detail.tags.is_empty() {
                        ui.horizontal_wrapped(|ui| {
                            for tag in &detail.tags {
                                ui.label(format!("#{tag}"));
                            }
                        });
                    }
                    if let Some(ocr) = detail.ocr_text.as_ref().filter(|t| !t.is_empty()) {
                        egui::CollapsingHeader::new("Extracted text").show(ui, |ui| {
                            ui.label(ocr);
                        });
                    }
                    if let Some(entity_id) = st.detail_entity_id() {
                        ui.hyperlink(BackendClient::image_content_url(
                            &st.backend_url,
                            &entity_id,
                        ));
                    }
                }
                if ui.button("Close").clicked() {
                    st.select(None);
                }
            } else {
                ui.label(egui::RichText::new("Select a node to view details").weak());
            }

            if !st.notices.is_empty() {
                ui.add_space(8.0);
                ui.separator();
                for notice in st.notices.iter() {
                    ui.label(
                        egui::RichText::new(&notice.text).color(egui::Color32::LIGHT_RED),
                    );
                }
            }
        });
}
